//! Query a layer by attribute inside a drawn area.
//!
//! 1. the user draws the query area,
//! 2. picks a layer of the base mapset,
//! 3. builds a predicate over its numeric columns,
//! 4. gets statistics and a PDF report of the matching features.

pub mod pipeline;
pub mod predicate;
pub mod report;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

use cityapp_grass::{ensure_writable, PERMANENT};
use cityapp_protocol::{Message, ModuleKind, Reply};

use crate::context::ModuleContext;
use crate::error::{ModuleError, Result};
use crate::module::{message, Module, Step};
use crate::validate;

pub use pipeline::{run_query, QueryOutcome, QUERY_RESOLUTION};
pub use predicate::{Condition, Connective, Operator, Predicate};

/// Working mapset of this module.
pub const MAPSET: &str = "attribute_query";
/// File name the browser uses for drawings.
pub const DRAWING_FILE: &str = "drawing.geojson";
pub const QUERY_AREA: &str = "query_area_1";
pub const QUERY_MAP: &str = "query_map";

/// Base layers and the selection are never offered for querying.
static EXCLUDED_LAYERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^lines(_osm)?$|^points(_osm)?$|^polygons(_osm)?$|^relations(_osm)?$|^selection$")
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeQueryStep {
    AwaitArea,
    SelectMap,
    BuildQuery,
    Finished,
}

impl Step for AttributeQueryStep {
    fn number(self) -> u32 {
        match self {
            AttributeQueryStep::AwaitArea => 1,
            AttributeQueryStep::SelectMap => 2,
            AttributeQueryStep::BuildQuery => 3,
            AttributeQueryStep::Finished => 4,
        }
    }

    fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(AttributeQueryStep::AwaitArea),
            2 => Some(AttributeQueryStep::SelectMap),
            3 => Some(AttributeQueryStep::BuildQuery),
            4 => Some(AttributeQueryStep::Finished),
            _ => None,
        }
    }

    fn is_terminal(self) -> bool {
        self == AttributeQueryStep::Finished
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeQuerySession {
    pub query_area: Option<String>,
    /// Layers offered at step 2.
    pub candidates: Vec<String>,
    pub target: Option<String>,
    pub topology: Option<String>,
    /// Numeric columns offered at step 3.
    pub columns: Vec<String>,
    pub statistics: Option<String>,
    /// File name of the finished report.
    pub report: Option<String>,
}

pub struct AttributeQuery;

impl AttributeQuery {
    /// `PERMANENT` layers that are not base layers and have at least one
    /// numeric column.
    fn candidate_layers(ctx: &ModuleContext) -> Result<Vec<String>> {
        let ops = ctx.ops();
        let mut candidates = Vec::new();
        for layer in ops.list_vectors(PERMANENT)? {
            if EXCLUDED_LAYERS.is_match(&layer) {
                continue;
            }
            if ops.numeric_columns(PERMANENT, &layer)?.is_empty() {
                debug!(layer, "skipping layer without numeric columns");
                continue;
            }
            candidates.push(layer);
        }
        Ok(candidates)
    }
}

impl Module for AttributeQuery {
    const KIND: ModuleKind = ModuleKind::AttributeQuery;

    type Step = AttributeQueryStep;
    type Session = AttributeQuerySession;

    fn launch(&self, ctx: &ModuleContext, _session: &mut Self::Session) -> Result<Self::Step> {
        ensure_writable(ctx.data_dir())?;
        ensure_writable(ctx.tile_dir())?;
        ensure_writable(ctx.output_dir())?;
        if !ctx.mapsets().exists(PERMANENT) {
            return Err(ModuleError::precondition(
                "No location is defined yet. Add a location before querying maps.",
            ));
        }
        ctx.mapsets().ensure_mapset(MAPSET)?;
        Ok(AttributeQueryStep::AwaitArea)
    }

    fn process(
        &self,
        ctx: &ModuleContext,
        session: &mut Self::Session,
        step: Self::Step,
        reply: &Reply,
    ) -> Result<Option<Self::Step>> {
        let ops = ctx.ops();
        match step {
            AttributeQueryStep::AwaitArea => {
                let file = validate::path(reply)?;
                if file.file_name().and_then(|n| n.to_str()) != Some(DRAWING_FILE) {
                    return Ok(None);
                }

                ops.import_vector(MAPSET, file, QUERY_AREA)?;
                ops.export_to_tiles(MAPSET, QUERY_AREA)?;
                session.query_area = Some(QUERY_AREA.to_string());
                session.candidates = Self::candidate_layers(ctx)?;
                Ok(Some(AttributeQueryStep::SelectMap))
            }
            AttributeQueryStep::SelectMap => {
                let target = validate::text(reply)?.trim();
                if !session.candidates.iter().any(|c| c == target) {
                    return Err(ModuleError::validation(format!(
                        "'{}' is not one of the offered maps.",
                        target
                    )));
                }

                ops.remove_vector(MAPSET, QUERY_MAP)?;
                let source_mapset = if ops.list_vectors_in(MAPSET, MAPSET)?.iter().any(|l| l == target) {
                    MAPSET
                } else {
                    PERMANENT
                };
                ops.copy_vector(MAPSET, target, source_mapset, QUERY_MAP)?;
                ops.export_to_tiles(MAPSET, QUERY_MAP)?;

                session.topology = Some(ops.topology(MAPSET, QUERY_MAP)?.to_string());
                session.columns = ops.numeric_columns(MAPSET, QUERY_MAP)?;
                session.target = Some(target.to_string());
                Ok(Some(AttributeQueryStep::BuildQuery))
            }
            AttributeQueryStep::BuildQuery => {
                let predicate = Predicate::parse(&validate::tokens(reply)?, &session.columns)?;
                let area = session.query_area.as_deref().unwrap_or(QUERY_AREA);

                let outcome = run_query(ctx, area, &predicate)?;
                session.report = outcome
                    .artifact
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned());
                session.statistics = Some(outcome.statistics);
                Ok(Some(AttributeQueryStep::Finished))
            }
            AttributeQueryStep::Finished => Ok(None),
        }
    }

    fn prompt(&self, session: &Self::Session, step: Self::Step) -> Message {
        let msg = message::<Self>(step);
        match step {
            AttributeQueryStep::AwaitArea => {
                msg.with_text("Draw the query area on the map, then save it.")
            }
            AttributeQueryStep::SelectMap => msg
                .with_text("Select the map to query.")
                .with_list(session.candidates.clone()),
            AttributeQueryStep::BuildQuery => {
                let msg = msg
                    .with_text("Build the query: select a column, an operator and a value. Join further conditions with AND, OR or NOT.")
                    .with_list(session.columns.clone());
                match &session.topology {
                    Some(topology) => msg.with_field("topology", topology.as_str()),
                    None => msg,
                }
            }
            AttributeQueryStep::Finished => {
                let msg = msg.with_text(session.statistics.clone().unwrap_or_default());
                match &session.report {
                    Some(file) => msg.with_field("file", file.as_str()),
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
    fn base_layers_are_excluded() {
        for layer in [
            "lines", "lines_osm", "points", "points_osm", "polygons", "polygons_osm",
            "relations", "relations_osm", "selection",
        ] {
            assert!(EXCLUDED_LAYERS.is_match(layer), "{layer}");
        }
        for layer in ["buildings", "selection_2", "my_lines", "polygons_osm_copy", "osm"] {
            assert!(!EXCLUDED_LAYERS.is_match(layer), "{layer}");
        }
    }

    #[test]
    fn finished_message_names_the_report() {
        let session = AttributeQuerySession {
            statistics: Some("Statistics and map results\n".to_string()),
            report: Some("query_results_2024-05-01_1430.pdf".to_string()),
            ..Default::default()
        };
        let msg = AttributeQuery.prompt(&session, AttributeQueryStep::Finished);
        assert_eq!(msg.message_id.to_string(), "attribute_query.4");
        assert_eq!(
            msg.field("file").and_then(|v| v.as_str()),
            Some("query_results_2024-05-01_1430.pdf")
        );
        assert!(msg.text().unwrap().starts_with("Statistics and map results"));
    }
}
