//! Query calculation: clip, filter, summarise and render one report.
//!
//! Stages run strictly in order inside the module mapset. Any failure
//! aborts the run. Intermediate layers may be left behind (the next run
//! overwrites them); the report only reaches the results directory once the
//! merged PDF exists.

use chrono::Utc;
use std::path::PathBuf;
use tracing::info;

use cityapp_report::{report_file_name, ReportAssembler};

use super::predicate::Predicate;
use super::report::statistics_text;
use super::{MAPSET, QUERY_MAP};
use crate::context::ModuleContext;
use crate::error::Result;

/// Cell size of the query region, in map units.
pub const QUERY_RESOLUTION: f64 = 0.00002;

pub const CLIPPED_LAYER: &str = "clipped_1";
pub const QUERY_RESULT: &str = "query_result";

const REPORT_PREFIX: &str = "query_results";

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// Statistics page text.
    pub statistics: String,
    /// The merged report in the results directory.
    pub artifact: PathBuf,
}

/// Run the query of `predicate` over `query_map`, limited to `area`.
pub fn run_query(ctx: &ModuleContext, area: &str, predicate: &Predicate) -> Result<QueryOutcome> {
    let ops = ctx.ops();
    let criteria = predicate.to_string();
    info!(area, %criteria, "running attribute query");

    ops.remove_vector(MAPSET, QUERY_RESULT)?;
    ops.set_region(MAPSET, area, QUERY_RESOLUTION)?;
    ops.set_mask(MAPSET, area)?;
    ops.select_overlap(MAPSET, QUERY_MAP, area, CLIPPED_LAYER)?;
    ops.extract(MAPSET, CLIPPED_LAYER, &criteria, QUERY_RESULT)?;

    let stats = ops.univar(MAPSET, QUERY_RESULT, predicate.query_column())?;
    ops.export_to_tiles(MAPSET, QUERY_RESULT)?;

    let created = Utc::now();
    let statistics = statistics_text(created, predicate.query_column(), &criteria, &stats);

    let mut report = ReportAssembler::new(ctx.documents().clone())?;
    report.add_text_page(&statistics)?;

    let map_ps = report.scratch_path("query_map.ps");
    ops.render_map(MAPSET, &ctx.layout().render_template(MAPSET), &map_ps)?;
    report.add_postscript_page(&map_ps)?;

    let artifact = ctx
        .output_dir()
        .join(report_file_name(REPORT_PREFIX, created));
    let artifact = report.finish(&artifact)?;

    Ok(QueryOutcome {
        statistics,
        artifact,
    })
}
