//! Store the default calculation resolution.

use serde::{Deserialize, Serialize};
use std::fs;
use tracing::info;

use cityapp_grass::ensure_writable;
use cityapp_protocol::{Message, ModuleKind, Reply};

use crate::context::ModuleContext;
use crate::error::{ModuleError, Result};
use crate::module::{message, Module, Step};
use crate::validate;

/// File under `<grass_dir>/variables` holding the resolution in meters.
pub const RESOLUTION_FILE: &str = "resolution";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetResolutionStep {
    Ask,
    AskAgain,
    Saved,
}

impl Step for SetResolutionStep {
    fn number(self) -> u32 {
        match self {
            SetResolutionStep::Ask => 1,
            SetResolutionStep::AskAgain => 2,
            SetResolutionStep::Saved => 3,
        }
    }

    fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(SetResolutionStep::Ask),
            2 => Some(SetResolutionStep::AskAgain),
            3 => Some(SetResolutionStep::Saved),
            _ => None,
        }
    }

    fn is_terminal(self) -> bool {
        self == SetResolutionStep::Saved
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetResolutionSession {
    pub resolution: Option<u32>,
}

pub struct SetResolution;

impl Module for SetResolution {
    const KIND: ModuleKind = ModuleKind::SetResolution;

    type Step = SetResolutionStep;
    type Session = SetResolutionSession;

    fn launch(&self, ctx: &ModuleContext, _session: &mut Self::Session) -> Result<Self::Step> {
        ensure_writable(&ctx.layout().variables_dir())?;
        Ok(SetResolutionStep::Ask)
    }

    fn process(
        &self,
        ctx: &ModuleContext,
        session: &mut Self::Session,
        step: Self::Step,
        reply: &Reply,
    ) -> Result<Option<Self::Step>> {
        match step {
            SetResolutionStep::Ask | SetResolutionStep::AskAgain => {
                let Some(resolution) = validate::text(reply).ok().and_then(validate::positive_integer)
                else {
                    return Ok(Some(SetResolutionStep::AskAgain));
                };

                let path = ctx.layout().variables_dir().join(RESOLUTION_FILE);
                fs::write(&path, format!("{}\n", resolution))
                    .map_err(|e| ModuleError::io(format!("write {}", path.display()), e))?;
                info!(resolution, "resolution stored");

                session.resolution = Some(resolution);
                Ok(Some(SetResolutionStep::Saved))
            }
            SetResolutionStep::Saved => Ok(None),
        }
    }

    fn prompt(&self, session: &Self::Session, step: Self::Step) -> Message {
        let msg = message::<Self>(step);
        match step {
            SetResolutionStep::Ask => {
                msg.with_text("Type the resolution of the calculations in meters.")
            }
            SetResolutionStep::AskAgain => {
                msg.with_text("The resolution must be a positive whole number of meters. Type it again.")
            }
            SetResolutionStep::Saved => {
                let value = session.resolution.unwrap_or_default();
                msg.with_text(format!("Resolution set to {} meters.", value))
                    .with_field("resolution", value)
            }
        }
    }
}
