//! Store the drawn area of interest as the `selection` layer.

use serde::{Deserialize, Serialize};

use cityapp_grass::{ensure_writable, PERMANENT};
use cityapp_protocol::{Message, ModuleKind, Reply};

use crate::context::ModuleContext;
use crate::error::{ModuleError, Result};
use crate::module::{message, Module, Step};
use crate::validate::{self, ArtifactKind, Choice};

pub const SELECTION_LAYER: &str = "selection";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetSelectionStep {
    ConfirmReplace,
    AwaitDrawing,
    Saved,
    Kept,
}

impl Step for SetSelectionStep {
    fn number(self) -> u32 {
        match self {
            SetSelectionStep::ConfirmReplace => 1,
            SetSelectionStep::AwaitDrawing => 2,
            SetSelectionStep::Saved => 3,
            SetSelectionStep::Kept => 4,
        }
    }

    fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(SetSelectionStep::ConfirmReplace),
            2 => Some(SetSelectionStep::AwaitDrawing),
            3 => Some(SetSelectionStep::Saved),
            4 => Some(SetSelectionStep::Kept),
            _ => None,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, SetSelectionStep::Saved | SetSelectionStep::Kept)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetSelectionSession {
    pub centre: Option<(String, String)>,
}

pub struct SetSelection;

impl Module for SetSelection {
    const KIND: ModuleKind = ModuleKind::SetSelection;

    type Step = SetSelectionStep;
    type Session = SetSelectionSession;

    fn launch(&self, ctx: &ModuleContext, _session: &mut Self::Session) -> Result<Self::Step> {
        ensure_writable(ctx.data_dir())?;
        ensure_writable(ctx.tile_dir())?;
        if !ctx.mapsets().exists(PERMANENT) {
            return Err(ModuleError::precondition(
                "No location is defined yet. Add a location first.",
            ));
        }

        let existing = ctx.ops().list_vectors_in(PERMANENT, PERMANENT)?;
        if existing.iter().any(|name| name == SELECTION_LAYER) {
            Ok(SetSelectionStep::ConfirmReplace)
        } else {
            Ok(SetSelectionStep::AwaitDrawing)
        }
    }

    fn process(
        &self,
        ctx: &ModuleContext,
        session: &mut Self::Session,
        step: Self::Step,
        reply: &Reply,
    ) -> Result<Option<Self::Step>> {
        match step {
            SetSelectionStep::ConfirmReplace => {
                match validate::choice(reply, &[Choice::Yes, Choice::No])? {
                    Choice::Yes => Ok(Some(SetSelectionStep::AwaitDrawing)),
                    _ => Ok(Some(SetSelectionStep::Kept)),
                }
            }
            SetSelectionStep::AwaitDrawing => {
                let file = validate::path(reply)?;
                if validate::classify_artifact(file)? != ArtifactKind::Vector {
                    return Err(ModuleError::UnsupportedFormat {
                        file: file.display().to_string(),
                        expected: "'geojson', 'gpkg', 'osm'",
                    });
                }

                let ops = ctx.ops();
                ops.import_vector(PERMANENT, file, SELECTION_LAYER)?;
                ops.export_to_tiles(PERMANENT, SELECTION_LAYER)?;
                let (east, north) = ops.region_center(PERMANENT, SELECTION_LAYER)?;
                session.centre = Some((north, east));
                Ok(Some(SetSelectionStep::Saved))
            }
            SetSelectionStep::Saved | SetSelectionStep::Kept => Ok(None),
        }
    }

    fn prompt(&self, session: &Self::Session, step: Self::Step) -> Message {
        let msg = message::<Self>(step);
        match step {
            SetSelectionStep::ConfirmReplace => msg
                .with_text("A selection already exists. Do you want to draw a new one?")
                .with_list(vec!["yes".to_string(), "no".to_string()]),
            SetSelectionStep::AwaitDrawing => {
                msg.with_text("Draw the area of interest on the map, then save it.")
            }
            SetSelectionStep::Saved => {
                let msg = msg.with_text("The selection has been saved.");
                match &session.centre {
                    Some((lat, lon)) => msg.with_field("lat", lat.as_str()).with_field("lon", lon.as_str()),
                    None => msg,
                }
            }
            SetSelectionStep::Kept => msg.with_text("The current selection is kept."),
        }
    }
}
