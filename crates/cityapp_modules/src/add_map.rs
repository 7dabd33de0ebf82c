//! Add a vector or raster layer to the base mapset.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use cityapp_grass::{ensure_writable, PERMANENT};
use cityapp_protocol::{Message, ModuleKind, Reply};

use crate::context::ModuleContext;
use crate::error::{ModuleError, Result};
use crate::module::{message, Module, Step};
use crate::validate::{self, ArtifactKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddMapStep {
    /// No location yet.
    NoLocation,
    AwaitFile,
    AwaitName,
    Added,
}

impl Step for AddMapStep {
    fn number(self) -> u32 {
        match self {
            AddMapStep::NoLocation => 1,
            AddMapStep::AwaitFile => 2,
            AddMapStep::AwaitName => 3,
            AddMapStep::Added => 4,
        }
    }

    fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(AddMapStep::NoLocation),
            2 => Some(AddMapStep::AwaitFile),
            3 => Some(AddMapStep::AwaitName),
            4 => Some(AddMapStep::Added),
            _ => None,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, AddMapStep::NoLocation | AddMapStep::Added)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddMapSession {
    pub file: Option<PathBuf>,
    pub kind: Option<ArtifactKind>,
    pub layer: Option<String>,
}

impl AddMapSession {
    /// The file stem, when it already is a valid layer name.
    fn suggested_name(&self) -> Option<String> {
        let stem = self.file.as_ref()?.file_stem()?.to_str()?;
        validate::is_valid_layer_name(stem).then(|| stem.to_string())
    }
}

pub struct AddMap;

impl Module for AddMap {
    const KIND: ModuleKind = ModuleKind::AddMap;

    type Step = AddMapStep;
    type Session = AddMapSession;

    fn launch(&self, ctx: &ModuleContext, _session: &mut Self::Session) -> Result<Self::Step> {
        ensure_writable(ctx.data_dir())?;
        ensure_writable(ctx.tile_dir())?;

        if ctx.mapsets().exists(PERMANENT) {
            Ok(AddMapStep::AwaitFile)
        } else {
            Ok(AddMapStep::NoLocation)
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
            AddMapStep::AwaitFile => {
                let file = validate::path(reply)?;
                let kind = validate::classify_artifact(file)?;
                session.file = Some(file.to_path_buf());
                session.kind = Some(kind);
                Ok(Some(AddMapStep::AwaitName))
            }
            AddMapStep::AwaitName => {
                let name = validate::validate_layer_name(validate::text(reply)?)?;
                let (Some(file), Some(kind)) = (&session.file, session.kind) else {
                    return Err(ModuleError::precondition("No map file has been uploaded."));
                };

                let ops = ctx.ops();
                match kind {
                    ArtifactKind::Vector => {
                        ops.import_vector(PERMANENT, file, name)?;
                        ops.export_to_tiles(PERMANENT, name)?;
                    }
                    ArtifactKind::Raster => {
                        ops.import_raster(PERMANENT, file, name)?;
                    }
                }
                info!(layer = name, ?kind, "map added");

                session.layer = Some(name.to_string());
                Ok(Some(AddMapStep::Added))
            }
            AddMapStep::NoLocation | AddMapStep::Added => Ok(None),
        }
    }

    fn prompt(&self, session: &Self::Session, step: Self::Step) -> Message {
        let msg = message::<Self>(step);
        match step {
            AddMapStep::NoLocation => {
                msg.with_text("No location is defined yet. Add a location before adding maps.")
            }
            AddMapStep::AwaitFile => msg.with_text(
                "Upload the map file. Vector maps: .geojson, .gpkg, .osm. Raster maps: .tif, .tiff, .gtif.",
            ),
            AddMapStep::AwaitName => {
                let msg = msg.with_text("Name the new map. Use a letter first, then letters, digits or '_'.");
                match session.suggested_name() {
                    Some(name) => msg.with_field("layerName", name),
                    None => msg,
                }
            }
            AddMapStep::Added => {
                let name = session.layer.as_deref().unwrap_or_default();
                msg.with_text(format!("Map '{}' has been added.", name))
                    .with_field("layerName", name)
            }
        }
    }
}
