//! Routes `launch` and `reply` calls to the owning module.

use tracing::{info, warn};

use cityapp_grass::PERMANENT;
use cityapp_protocol::{Message, MessageId, ModuleKind, Reply, TableDescription};

use crate::add_location::AddLocation;
use crate::add_map::AddMap;
use crate::attribute_query::AttributeQuery;
use crate::context::ModuleContext;
use crate::error::{ModuleError, Result};
use crate::module::DynModule;
use crate::session::SessionStore;
use crate::set_resolution::SetResolution;
use crate::set_selection::SetSelection;

/// The wizard front door.
///
/// Sessions live in the [`SessionStore`] the caller passes in; the wizard
/// itself holds no conversation state. Taking the store by `&mut` keeps two
/// calls from interleaving on one store.
pub struct Wizard {
    ctx: ModuleContext,
    modules: Vec<Box<dyn DynModule>>,
}

impl Wizard {
    pub fn new(ctx: ModuleContext) -> Self {
        let modules: Vec<Box<dyn DynModule>> = vec![
            Box::new(AddLocation),
            Box::new(SetSelection),
            Box::new(SetResolution),
            Box::new(AddMap),
            Box::new(AttributeQuery),
        ];
        Self { ctx, modules }
    }

    pub fn context(&self) -> &ModuleContext {
        &self.ctx
    }

    pub fn modules(&self) -> Vec<ModuleKind> {
        self.modules.iter().map(|m| m.kind()).collect()
    }

    fn module(&self, kind: ModuleKind) -> Result<&dyn DynModule> {
        self.modules
            .iter()
            .find(|m| m.kind() == kind)
            .map(|m| m.as_ref())
            .ok_or_else(|| ModuleError::UnknownRoute(kind.to_string()))
    }

    /// Start (or restart) a module and return its first message.
    pub fn launch(&self, store: &mut SessionStore, module: &str) -> Result<Message> {
        let kind: ModuleKind = module.parse()?;
        let (session, message) = self.module(kind)?.launch(&self.ctx)?;
        store.put(kind, session);
        Ok(message)
    }

    /// Answer the message `message_id`.
    ///
    /// Returns `None` when the reply changes nothing: the module is waiting
    /// for a different input, or `message_id` is a terminal acknowledgment.
    /// Invalid input produces the same step's message again, with an
    /// `error` field, and leaves the session as it was.
    pub fn reply(
        &self,
        store: &mut SessionStore,
        message_id: &str,
        reply: Reply,
    ) -> Result<Option<Message>> {
        let id: MessageId = message_id.parse()?;
        let module = self.module(id.module)?;

        let stored = store
            .get(id.module)
            .ok_or_else(|| ModuleError::UnknownRoute(format!("{} (module not launched)", id)))?;
        if stored.step != id.step {
            return Err(ModuleError::UnknownRoute(format!(
                "{} (expected a reply to {}.{})",
                id, id.module, stored.step
            )));
        }
        if module.is_terminal(id.step) {
            return Ok(None);
        }

        match module.reply(&self.ctx, stored, id.step, &reply) {
            Ok(Some((session, message))) => {
                store.put(id.module, session);
                Ok(Some(message))
            }
            Ok(None) => Ok(None),
            Err(ModuleError::Validation(reason)) => {
                warn!(message_id = %id, %reason, "invalid reply, prompting again");
                Ok(Some(module.prompt(stored)?.with_field("error", reason)))
            }
            Err(err) => Err(err),
        }
    }

    /// Names of the finished reports, sorted.
    pub fn list_results(&self) -> Result<Vec<String>> {
        Ok(cityapp_report::list_reports(self.ctx.output_dir())?)
    }

    /// Attribute description of a `PERMANENT` table with numeric bounds.
    pub fn describe_table(&self, table: &str) -> Result<TableDescription> {
        info!(table, "describing table");
        Ok(self.ctx.ops().describe_table(PERMANENT, table)?)
    }
}
