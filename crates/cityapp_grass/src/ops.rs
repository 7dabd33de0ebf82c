//! Typed engine operations.
//!
//! Each method issues exactly one GRASS tool (two for
//! [`GisOps::describe_table`] bounds) against a named mapset and returns the
//! parsed result.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use cityapp_protocol::TableDescription;

use crate::command::GrassCommand;
use crate::error::Result;
use crate::gateway::Engine;
use crate::parse::{
    self, is_numeric_type, parse_columns, parse_description, truncate_decimal, ColumnInfo,
    StatKey, Topology, TopologyCounts, UnivariateStats,
};

/// Fractional digits kept for column bounds in table descriptions.
const BOUND_DIGITS: usize = 2;

#[derive(Clone)]
pub struct GisOps {
    engine: Arc<dyn Engine>,
    tile_dir: PathBuf,
}

impl GisOps {
    /// `tile_dir` is where layers are exported for the tile server
    /// (`<geoserver_data_dir>/data`).
    pub fn new(engine: Arc<dyn Engine>, tile_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            tile_dir: tile_dir.into(),
        }
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    pub fn tile_dir(&self) -> &Path {
        &self.tile_dir
    }

    pub fn run(&self, mapset: &str, command: &GrassCommand) -> Result<String> {
        let out = self.engine.run(mapset, command)?;
        debug!(tool = command.tool(), bytes = out.len(), "tool finished");
        Ok(out)
    }

    pub fn create_location(&self, mapset: &str, georef: &Path) -> Result<()> {
        self.engine.create_location(mapset, georef)
    }

    // ------------------------------------------------------------------
    // Import / export
    // ------------------------------------------------------------------

    pub fn import_vector(&self, mapset: &str, input: &Path, output: &str) -> Result<()> {
        let cmd = GrassCommand::new("v.import")
            .param("input", input.display())
            .param("output", output)
            .overwrite();
        self.run(mapset, &cmd).map(drop)
    }

    pub fn import_raster(&self, mapset: &str, input: &Path, output: &str) -> Result<()> {
        let cmd = GrassCommand::new("r.import")
            .param("input", input.display())
            .param("output", output)
            .overwrite();
        self.run(mapset, &cmd).map(drop)
    }

    /// Import one layer of an OSM file without projection check.
    pub fn import_osm(&self, mapset: &str, input: &Path, layer: &str, output: &str) -> Result<()> {
        let cmd = GrassCommand::new("v.in.ogr")
            .flag("o")
            .param("input", input.display())
            .param("layer", layer)
            .param("output", output)
            .overwrite();
        self.run(mapset, &cmd).map(drop)
    }

    /// Write `layer` as GeoPackage into the tile directory and return the
    /// file path.
    pub fn export_to_tiles(&self, mapset: &str, layer: &str) -> Result<PathBuf> {
        let target = self.tile_dir.join(format!("{}.gpkg", layer));
        let cmd = GrassCommand::new("v.out.ogr")
            .param("format", "GPKG")
            .param("input", layer)
            .param("output", target.display())
            .overwrite();
        self.run(mapset, &cmd)?;
        Ok(target)
    }

    // ------------------------------------------------------------------
    // Layer management
    // ------------------------------------------------------------------

    pub fn remove_vector(&self, mapset: &str, name: &str) -> Result<()> {
        let cmd = GrassCommand::new("g.remove")
            .flag("f")
            .param("type", "vector")
            .param("name", name);
        self.run(mapset, &cmd).map(drop)
    }

    /// Copy `source@source_mapset` into `mapset` as `target`.
    pub fn copy_vector(
        &self,
        mapset: &str,
        source: &str,
        source_mapset: &str,
        target: &str,
    ) -> Result<()> {
        let cmd = GrassCommand::new("g.copy")
            .param("vector", format!("{}@{},{}", source, source_mapset, target));
        self.run(mapset, &cmd).map(drop)
    }

    /// Vector layers visible from `mapset` (its search path included).
    pub fn list_vectors(&self, mapset: &str) -> Result<Vec<String>> {
        let cmd = GrassCommand::new("g.list").param("type", "vector");
        Ok(parse::parse_list(&self.run(mapset, &cmd)?))
    }

    /// Vector layers stored in `source_mapset` only.
    pub fn list_vectors_in(&self, mapset: &str, source_mapset: &str) -> Result<Vec<String>> {
        let cmd = GrassCommand::new("g.list")
            .param("type", "vector")
            .param("mapset", source_mapset);
        Ok(parse::parse_list(&self.run(mapset, &cmd)?))
    }

    // ------------------------------------------------------------------
    // Attributes and statistics
    // ------------------------------------------------------------------

    pub fn columns(&self, mapset: &str, table: &str) -> Result<Vec<ColumnInfo>> {
        let cmd = GrassCommand::new("db.describe").flag("c").param("table", table);
        Ok(parse_columns(&self.run(mapset, &cmd)?))
    }

    /// Names of the numeric, non-key columns of `table`.
    pub fn numeric_columns(&self, mapset: &str, table: &str) -> Result<Vec<String>> {
        Ok(self
            .columns(mapset, table)?
            .into_iter()
            .filter(ColumnInfo::is_numeric)
            .map(|c| c.name)
            .collect())
    }

    pub fn univar(&self, mapset: &str, map: &str, column: &str) -> Result<UnivariateStats> {
        let cmd = GrassCommand::new("v.db.univar")
            .flag("e")
            .flag("g")
            .param("map", map)
            .param("column", column);
        Ok(UnivariateStats::parse(&self.run(mapset, &cmd)?))
    }

    /// `(min, max)` of a column, truncated to two fractional digits.
    /// Missing statistics come back empty.
    pub fn univar_bounds(&self, mapset: &str, map: &str, column: &str) -> Result<(String, String)> {
        let stats = self.univar(mapset, map, column)?;
        let bound = |key| {
            stats
                .get(key)
                .map(|v| truncate_decimal(v, BOUND_DIGITS))
                .unwrap_or_default()
        };
        Ok((bound(StatKey::Min), bound(StatKey::Max)))
    }

    pub fn topology(&self, mapset: &str, map: &str) -> Result<Topology> {
        let cmd = GrassCommand::new("v.info").flag("t").param("map", map);
        Ok(TopologyCounts::parse(&self.run(mapset, &cmd)?).classify())
    }

    /// Describe `table` and attach `min`/`max` to every numeric column
    /// other than `cat`.
    pub fn describe_table(&self, mapset: &str, table: &str) -> Result<TableDescription> {
        let cmd = GrassCommand::new("db.describe").param("table", table);
        let mut description = parse_description(&self.run(mapset, &cmd)?);

        for row in description.columns.rows.iter_mut() {
            let Some(column) = row.get("column").map(str::to_string) else {
                continue;
            };
            let numeric = row.get("type").is_some_and(is_numeric_type);
            if !numeric || column.eq_ignore_ascii_case("cat") {
                continue;
            }
            let (min, max) = self.univar_bounds(mapset, table, &column)?;
            row.insert("min", min);
            row.insert("max", max);
        }

        Ok(description)
    }

    // ------------------------------------------------------------------
    // Region, mask and selection
    // ------------------------------------------------------------------

    /// Centre `(easting, northing)` of the region fitted to `vector`.
    pub fn region_center(&self, mapset: &str, vector: &str) -> Result<(String, String)> {
        let cmd = GrassCommand::new("g.region").flag("cg").param("vector", vector);
        parse::parse_region_center(&self.run(mapset, &cmd)?)
    }

    pub fn set_region(&self, mapset: &str, vector: &str, resolution: f64) -> Result<()> {
        let cmd = GrassCommand::new("g.region")
            .param("vector", vector)
            .param("res", resolution);
        self.run(mapset, &cmd).map(drop)
    }

    pub fn set_mask(&self, mapset: &str, vector: &str) -> Result<()> {
        let cmd = GrassCommand::new("r.mask").param("vector", vector).overwrite();
        self.run(mapset, &cmd).map(drop)
    }

    /// Features of `ainput` overlapping the areas of `binput`.
    pub fn select_overlap(&self, mapset: &str, ainput: &str, binput: &str, output: &str) -> Result<()> {
        let cmd = GrassCommand::new("v.select")
            .param("ainput", ainput)
            .param("atype", "point,line,boundary,centroid,area")
            .param("binput", binput)
            .param("btype", "area")
            .param("output", output)
            .param("operator", "overlap")
            .overwrite();
        self.run(mapset, &cmd).map(drop)
    }

    pub fn extract(&self, mapset: &str, input: &str, predicate: &str, output: &str) -> Result<()> {
        let cmd = GrassCommand::new("v.extract")
            .param("input", input)
            .param("where", predicate)
            .param("output", output)
            .overwrite();
        self.run(mapset, &cmd).map(drop)
    }

    /// Render a map to PostScript with a `ps.map` template.
    pub fn render_map(&self, mapset: &str, template: &Path, output: &Path) -> Result<()> {
        let cmd = GrassCommand::new("ps.map")
            .param("input", template.display())
            .param("output", output.display())
            .overwrite();
        self.run(mapset, &cmd).map(drop)
    }
}

impl std::fmt::Debug for GisOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GisOps")
            .field("tile_dir", &self.tile_dir)
            .finish_non_exhaustive()
    }
}
