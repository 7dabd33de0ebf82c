use std::path::{Path, PathBuf};
use std::sync::Arc;

use cityapp_grass::{Engine, GisLayout, GisOps, MapsetManager};
use cityapp_report::DocumentTools;

/// Directories the modules read from and write to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Where the browser drops uploads and drawings.
    pub data_from_browser_dir: PathBuf,
    /// GeoServer data root; layers are exported into its `data/` folder.
    pub geoserver_data_dir: PathBuf,
    /// GIS root holding `global/`, `skel/` and `variables/`.
    pub grass_dir: PathBuf,
    /// Finished reports.
    pub output_dir: PathBuf,
}

impl Paths {
    pub fn tile_dir(&self) -> PathBuf {
        self.geoserver_data_dir.join("data")
    }
}

/// Shared services handed to every module call.
#[derive(Clone)]
pub struct ModuleContext {
    paths: Paths,
    layout: GisLayout,
    ops: GisOps,
    mapsets: MapsetManager,
    documents: Arc<dyn DocumentTools>,
}

impl ModuleContext {
    pub fn new(paths: Paths, engine: Arc<dyn Engine>, documents: Arc<dyn DocumentTools>) -> Self {
        let layout = GisLayout::new(&paths.grass_dir);
        Self {
            ops: GisOps::new(engine, paths.tile_dir()),
            mapsets: MapsetManager::new(layout.clone()),
            layout,
            paths,
            documents,
        }
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn layout(&self) -> &GisLayout {
        &self.layout
    }

    pub fn ops(&self) -> &GisOps {
        &self.ops
    }

    pub fn mapsets(&self) -> &MapsetManager {
        &self.mapsets
    }

    pub fn documents(&self) -> &Arc<dyn DocumentTools> {
        &self.documents
    }

    /// Where uploads and drawings arrive from the browser.
    pub fn data_dir(&self) -> &Path {
        &self.paths.data_from_browser_dir
    }

    pub fn tile_dir(&self) -> &Path {
        self.ops.tile_dir()
    }

    pub fn output_dir(&self) -> &Path {
        &self.paths.output_dir
    }
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext")
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}
