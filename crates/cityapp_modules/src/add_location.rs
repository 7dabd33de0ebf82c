//! Create or replace the base location from an OpenStreetMap extract.

use serde::{Deserialize, Serialize};
use tracing::info;

use cityapp_grass::{ensure_writable, PERMANENT};
use cityapp_protocol::{Message, ModuleKind, Reply};

use crate::context::ModuleContext;
use crate::error::{ModuleError, Result};
use crate::module::{message, Module, Step};
use crate::validate::{self, Choice};

/// OSM layers imported into `PERMANENT`, with their layer names.
pub const OSM_LAYERS: [(&str, &str); 4] = [
    ("points", "points_osm"),
    ("lines", "lines_osm"),
    ("multipolygons", "polygons_osm"),
    ("other_relations", "relations_osm"),
];

/// Layer whose region centre is reported for a new location.
const CENTRE_LAYER: &str = "polygons_osm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddLocationStep {
    /// A location exists; replace it?
    ConfirmReplace,
    /// Location kept.
    Kept,
    /// Waiting for the `.osm` file.
    AwaitOsm,
    /// Location imported.
    Done,
}

impl Step for AddLocationStep {
    fn number(self) -> u32 {
        match self {
            AddLocationStep::ConfirmReplace => 1,
            AddLocationStep::Kept => 3,
            AddLocationStep::AwaitOsm => 4,
            AddLocationStep::Done => 5,
        }
    }

    fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(AddLocationStep::ConfirmReplace),
            3 => Some(AddLocationStep::Kept),
            4 => Some(AddLocationStep::AwaitOsm),
            5 => Some(AddLocationStep::Done),
            _ => None,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, AddLocationStep::Kept | AddLocationStep::Done)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddLocationSession {
    /// `(lat, lon)` of the imported location.
    pub centre: Option<(String, String)>,
}

pub struct AddLocation;

impl Module for AddLocation {
    const KIND: ModuleKind = ModuleKind::AddLocation;

    type Step = AddLocationStep;
    type Session = AddLocationSession;

    fn launch(&self, ctx: &ModuleContext, _session: &mut Self::Session) -> Result<Self::Step> {
        ensure_writable(ctx.data_dir())?;
        ensure_writable(ctx.tile_dir())?;

        if ctx.mapsets().exists(PERMANENT) {
            Ok(AddLocationStep::ConfirmReplace)
        } else {
            Ok(AddLocationStep::AwaitOsm)
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
            AddLocationStep::ConfirmReplace => {
                match validate::choice(reply, &[Choice::Yes, Choice::No])? {
                    Choice::Yes => Ok(Some(AddLocationStep::AwaitOsm)),
                    _ => Ok(Some(AddLocationStep::Kept)),
                }
            }
            AddLocationStep::AwaitOsm => {
                let file = validate::path(reply)?;
                if !validate::has_extension(file, &["osm"]) {
                    return Err(ModuleError::UnsupportedFormat {
                        file: file.display().to_string(),
                        expected: "'osm'",
                    });
                }

                let ops = ctx.ops();
                if !ctx.mapsets().exists(PERMANENT) {
                    info!(file = %file.display(), "creating location");
                    ops.create_location(PERMANENT, file)?;
                }

                for (layer, name) in OSM_LAYERS {
                    ops.import_osm(PERMANENT, file, layer, name)?;
                    ops.export_to_tiles(PERMANENT, name)?;
                }

                // A selection drawn on the previous location no longer fits.
                if ops
                    .list_vectors_in(PERMANENT, PERMANENT)?
                    .iter()
                    .any(|name| name == "selection")
                {
                    ops.remove_vector(PERMANENT, "selection")?;
                }

                let (east, north) = ops.region_center(PERMANENT, CENTRE_LAYER)?;
                session.centre = Some((north, east));
                Ok(Some(AddLocationStep::Done))
            }
            AddLocationStep::Kept | AddLocationStep::Done => Ok(None),
        }
    }

    fn prompt(&self, session: &Self::Session, step: Self::Step) -> Message {
        let msg = message::<Self>(step);
        match step {
            AddLocationStep::ConfirmReplace => msg
                .with_text("A location is already defined. Do you want to replace it with a new one?")
                .with_list(vec!["yes".to_string(), "no".to_string()]),
            AddLocationStep::Kept => msg.with_text("The current location is kept."),
            AddLocationStep::AwaitOsm => {
                msg.with_text("Upload an OpenStreetMap (.osm) file of the new location.")
            }
            AddLocationStep::Done => {
                let msg = msg.with_text("The new location has been added.");
                match &session.centre {
                    Some((lat, lon)) => msg.with_field("lat", lat.as_str()).with_field("lon", lon.as_str()),
                    None => msg,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_numbers_round_trip() {
        for n in [1, 3, 4, 5] {
            assert_eq!(AddLocationStep::from_number(n).unwrap().number(), n);
        }
        assert_eq!(AddLocationStep::from_number(2), None);
    }

    #[test]
    fn done_message_carries_coordinates() {
        let session = AddLocationSession {
            centre: Some(("47.49".to_string(), "19.04".to_string())),
        };
        let msg = AddLocation.prompt(&session, AddLocationStep::Done);
        assert_eq!(msg.message_id.to_string(), "add_location.5");
        assert_eq!(msg.field("lat").and_then(|v| v.as_str()), Some("47.49"));
        assert_eq!(msg.field("lon").and_then(|v| v.as_str()), Some("19.04"));
    }
}
