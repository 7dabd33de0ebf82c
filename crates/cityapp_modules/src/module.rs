//! The step protocol every wizard module follows.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use cityapp_protocol::{Message, ModuleKind, Reply};

use crate::context::ModuleContext;
use crate::error::{ModuleError, Result};
use crate::session::StoredSession;

/// A module's steps. The number is the suffix of the message id.
pub trait Step: Copy + std::fmt::Debug + Sized {
    fn number(self) -> u32;

    fn from_number(number: u32) -> Option<Self>;

    /// Terminal steps expect no reply.
    fn is_terminal(self) -> bool;
}

/// One wizard module.
///
/// `launch` and `process` receive the module's own session. The dispatcher
/// persists the session only when the call succeeds, so a failed step
/// leaves the previous state in place.
pub trait Module: Send + Sync {
    const KIND: ModuleKind;

    type Step: Step;
    type Session: Default + Serialize + DeserializeOwned;

    /// Check preconditions, do one-time setup and return the first step.
    /// The session passed in is already reset.
    fn launch(&self, ctx: &ModuleContext, session: &mut Self::Session) -> Result<Self::Step>;

    /// Handle a reply to `step`. `None` means the reply does not move the
    /// conversation.
    fn process(
        &self,
        ctx: &ModuleContext,
        session: &mut Self::Session,
        step: Self::Step,
        reply: &Reply,
    ) -> Result<Option<Self::Step>>;

    /// Render the message of `step`.
    fn prompt(&self, session: &Self::Session, step: Self::Step) -> Message;
}

/// Shorthand for a message of module `M` at `step`.
pub fn message<M: Module>(step: M::Step) -> Message {
    Message::new(M::KIND, step.number())
}

/// Object-safe face of [`Module`], used by the dispatcher.
pub(crate) trait DynModule: Send + Sync {
    fn kind(&self) -> ModuleKind;

    fn launch(&self, ctx: &ModuleContext) -> Result<(StoredSession, Message)>;

    fn reply(
        &self,
        ctx: &ModuleContext,
        stored: &StoredSession,
        step: u32,
        reply: &Reply,
    ) -> Result<Option<(StoredSession, Message)>>;

    fn prompt(&self, stored: &StoredSession) -> Result<Message>;

    fn is_terminal(&self, step: u32) -> bool;
}

impl<M: Module> DynModule for M {
    fn kind(&self) -> ModuleKind {
        M::KIND
    }

    fn launch(&self, ctx: &ModuleContext) -> Result<(StoredSession, Message)> {
        let mut session = M::Session::default();
        let step = Module::launch(self, ctx, &mut session)?;
        info!(module = %M::KIND, step = step.number(), "module launched");
        let message = Module::prompt(self, &session, step);
        Ok((store::<M>(step, &session)?, message))
    }

    fn reply(
        &self,
        ctx: &ModuleContext,
        stored: &StoredSession,
        step: u32,
        reply: &Reply,
    ) -> Result<Option<(StoredSession, Message)>> {
        let step = parse_step::<M>(step)?;
        let mut session = restore::<M>(stored)?;

        let Some(next) = Module::process(self, ctx, &mut session, step, reply)? else {
            return Ok(None);
        };
        info!(module = %M::KIND, from = step.number(), to = next.number(), "step advanced");
        let message = Module::prompt(self, &session, next);
        Ok(Some((store::<M>(next, &session)?, message)))
    }

    fn prompt(&self, stored: &StoredSession) -> Result<Message> {
        let step = parse_step::<M>(stored.step)?;
        let session = restore::<M>(stored)?;
        Ok(Module::prompt(self, &session, step))
    }

    fn is_terminal(&self, step: u32) -> bool {
        M::Step::from_number(step).is_some_and(Step::is_terminal)
    }
}

fn parse_step<M: Module>(step: u32) -> Result<M::Step> {
    M::Step::from_number(step).ok_or_else(|| ModuleError::UnknownRoute(format!("{}.{}", M::KIND, step)))
}

fn store<M: Module>(step: M::Step, session: &M::Session) -> Result<StoredSession> {
    let state = serde_json::to_value(session).map_err(|source| ModuleError::Session {
        module: M::KIND.to_string(),
        source,
    })?;
    Ok(StoredSession {
        step: step.number(),
        state,
    })
}

fn restore<M: Module>(stored: &StoredSession) -> Result<M::Session> {
    if stored.state.is_null() {
        return Ok(M::Session::default());
    }
    serde_json::from_value(stored.state.clone()).map_err(|source| ModuleError::Session {
        module: M::KIND.to_string(),
        source,
    })
}
