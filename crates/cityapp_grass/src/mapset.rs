//! Mapset State Manager
//!
//! Layout of the GIS root:
//!
//! ```text
//! <grass_dir>/
//!   global/                  location holding the mapsets
//!     PERMANENT/WIND         base mapset and its region
//!     <module>/              one working mapset per wizard module
//!   skel/                    files copied into every new mapset
//!   variables/defaults/      per-module map render templates
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{GrassError, Result};

/// The base mapset every location has.
pub const PERMANENT: &str = "PERMANENT";

const REGION_FILE: &str = "WIND";

/// Paths inside the GIS root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GisLayout {
    root: PathBuf,
}

impl GisLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder holding the mapsets, passed to the engine as the location.
    pub fn location_dir(&self) -> PathBuf {
        self.root.join("global")
    }

    pub fn mapset_dir(&self, name: &str) -> PathBuf {
        self.location_dir().join(name)
    }

    pub fn skel_dir(&self) -> PathBuf {
        self.root.join("skel")
    }

    pub fn variables_dir(&self) -> PathBuf {
        self.root.join("variables")
    }

    /// `ps.map` template used to render a module's result map.
    pub fn render_template(&self, module: &str) -> PathBuf {
        self.variables_dir()
            .join("defaults")
            .join(format!("{}.ps_param_1", module))
    }
}

/// Fail with [`GrassError::DirectoryNotWritable`] unless a file can be
/// created in `path`.
pub fn ensure_writable(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(GrassError::DirectoryNotWritable {
            path: path.to_path_buf(),
        });
    }
    tempfile::Builder::new()
        .prefix(".cityapp-probe")
        .tempfile_in(path)
        .map(drop)
        .map_err(|_| GrassError::DirectoryNotWritable {
            path: path.to_path_buf(),
        })
}

/// Creates and inspects mapset directories.
#[derive(Debug, Clone)]
pub struct MapsetManager {
    layout: GisLayout,
}

impl MapsetManager {
    pub fn new(layout: GisLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &GisLayout {
        &self.layout
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.layout.mapset_dir(name)
    }

    /// A mapset exists once its directory holds a region file.
    pub fn exists(&self, name: &str) -> bool {
        self.path(name).join(REGION_FILE).is_file()
    }

    /// Create `name` from the template unless it already exists.
    ///
    /// New mapsets get the `PERMANENT` region plus every file of `skel/`.
    /// The mapset is assembled in a staging directory next to its final
    /// place and renamed in only once every copy succeeded; a directory
    /// without a region file is residue of an interrupted creation and is
    /// rebuilt.
    pub fn ensure_mapset(&self, name: &str) -> Result<()> {
        if self.exists(name) {
            return Ok(());
        }
        if !self.exists(PERMANENT) {
            return Err(GrassError::MapsetMissing {
                name: PERMANENT.to_string(),
            });
        }

        let target = self.path(name);
        info!(mapset = name, "creating mapset from template");
        let location = self.layout.location_dir();
        let staging = tempfile::Builder::new()
            .prefix(&format!(".{}-", name))
            .tempdir_in(&location)
            .map_err(|e| GrassError::io(format!("stage mapset in {}", location.display()), e))?;

        let region = self.path(PERMANENT).join(REGION_FILE);
        copy_file(&region, &staging.path().join(REGION_FILE))?;

        let skel = self.layout.skel_dir();
        let entries = fs::read_dir(&skel)
            .map_err(|e| GrassError::io(format!("read {}", skel.display()), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| GrassError::io(format!("read {}", skel.display()), e))?;
            if entry.path().is_file() {
                copy_file(&entry.path(), &staging.path().join(entry.file_name()))?;
            }
        }

        if target.exists() {
            warn!(mapset = name, "replacing incomplete mapset directory");
            fs::remove_dir_all(&target)
                .map_err(|e| GrassError::io(format!("remove {}", target.display()), e))?;
        }
        // The staging guard finds nothing left to clean up after the rename.
        fs::rename(staging.path(), &target)
            .map_err(|e| GrassError::io(format!("move mapset into {}", target.display()), e))
    }
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to)
        .map(drop)
        .map_err(|e| GrassError::io(format!("copy {} to {}", from.display(), to.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(root: &Path) -> MapsetManager {
        let layout = GisLayout::new(root);
        fs::create_dir_all(layout.mapset_dir(PERMANENT)).unwrap();
        fs::write(layout.mapset_dir(PERMANENT).join("WIND"), "proj: 3\n").unwrap();
        fs::create_dir_all(layout.skel_dir()).unwrap();
        fs::write(layout.skel_dir().join("VAR"), "DB_DRIVER: sqlite\n").unwrap();
        fs::write(layout.skel_dir().join("SEARCH_PATH"), "PERMANENT\n").unwrap();
        MapsetManager::new(layout)
    }

    #[test]
    fn new_mapset_gets_region_and_skeleton() {
        let dir = tempfile::tempdir().unwrap();
        let manager = template(dir.path());

        assert!(!manager.exists("attribute_query"));
        manager.ensure_mapset("attribute_query").unwrap();

        let mapset = manager.path("attribute_query");
        assert_eq!(fs::read_to_string(mapset.join("WIND")).unwrap(), "proj: 3\n");
        assert!(mapset.join("VAR").is_file());
        assert!(mapset.join("SEARCH_PATH").is_file());
        assert!(manager.exists("attribute_query"));
    }

    #[test]
    fn existing_mapset_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let manager = template(dir.path());
        let mapset = manager.path("attribute_query");
        fs::create_dir_all(&mapset).unwrap();
        fs::write(mapset.join("WIND"), "custom region\n").unwrap();

        manager.ensure_mapset("attribute_query").unwrap();

        assert_eq!(fs::read_to_string(mapset.join("WIND")).unwrap(), "custom region\n");
        assert!(!mapset.join("VAR").exists());
    }

    #[test]
    fn failed_creation_leaves_nothing_and_can_be_retried() {
        let dir = tempfile::tempdir().unwrap();
        let manager = template(dir.path());
        fs::remove_dir_all(manager.layout().skel_dir()).unwrap();

        let err = manager.ensure_mapset("attribute_query").unwrap_err();
        assert!(matches!(err, GrassError::Io { .. }), "{err:?}");
        assert!(!manager.path("attribute_query").exists());
        let names: Vec<_> = fs::read_dir(manager.layout().location_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![PERMANENT]);

        fs::create_dir_all(manager.layout().skel_dir()).unwrap();
        fs::write(manager.layout().skel_dir().join("VAR"), "DB_DRIVER: sqlite\n").unwrap();
        manager.ensure_mapset("attribute_query").unwrap();

        let mapset = manager.path("attribute_query");
        assert!(mapset.join("WIND").is_file());
        assert!(mapset.join("VAR").is_file());
    }

    #[test]
    fn directory_without_region_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let manager = template(dir.path());
        let mapset = manager.path("attribute_query");
        fs::create_dir_all(&mapset).unwrap();
        fs::write(mapset.join("stale"), "x").unwrap();

        manager.ensure_mapset("attribute_query").unwrap();

        assert!(manager.exists("attribute_query"));
        assert!(mapset.join("VAR").is_file());
        assert!(!mapset.join("stale").exists());
    }

    #[test]
    fn creation_requires_permanent() {
        let dir = tempfile::tempdir().unwrap();
        let manager = MapsetManager::new(GisLayout::new(dir.path()));

        let err = manager.ensure_mapset("attribute_query").unwrap_err();
        assert!(matches!(err, GrassError::MapsetMissing { ref name } if name == PERMANENT));
        assert!(!manager.path("attribute_query").exists());
    }

    #[test]
    fn writable_probe_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        ensure_writable(dir.path()).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_directory_is_not_writable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = ensure_writable(&missing).unwrap_err();
        assert!(matches!(err, GrassError::DirectoryNotWritable { path } if path == missing));
    }

    #[test]
    fn render_template_is_named_after_module() {
        let layout = GisLayout::new("/gis");
        assert_eq!(
            layout.render_template("attribute_query"),
            PathBuf::from("/gis/variables/defaults/attribute_query.ps_param_1")
        );
        assert_eq!(layout.mapset_dir("PERMANENT"), PathBuf::from("/gis/global/PERMANENT"));
    }
}
