//! Throwaway directory tree shaped like a CityApp installation.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Template used by the attribute query to render its map.
pub const QUERY_TEMPLATE: &str = "paper a4\nvareas query_result\nend\n";

/// ```text
/// <root>/
///   grass/global/PERMANENT/WIND
///   grass/skel/{VAR,SEARCH_PATH}
///   grass/variables/defaults/attribute_query.ps_param_1
///   data_from_browser/
///   geoserver/data/
///   output/
/// ```
///
/// The tree is deleted when the fixture is dropped.
pub struct GisFixture {
    _root: TempDir,
    pub root: PathBuf,
    pub grass_dir: PathBuf,
    pub data_from_browser_dir: PathBuf,
    pub geoserver_data_dir: PathBuf,
    pub tile_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl GisFixture {
    /// A tree with a `PERMANENT` mapset.
    pub fn new() -> Self {
        let fixture = Self::without_permanent();
        fixture.create_permanent();
        fixture
    }

    /// A tree where no location has been defined yet.
    pub fn without_permanent() -> Self {
        let root = tempfile::tempdir().unwrap();
        let base = root.path().to_path_buf();

        let fixture = Self {
            grass_dir: base.join("grass"),
            data_from_browser_dir: base.join("data_from_browser"),
            geoserver_data_dir: base.join("geoserver"),
            tile_dir: base.join("geoserver").join("data"),
            output_dir: base.join("output"),
            root: base,
            _root: root,
        };

        let skel = fixture.grass_dir.join("skel");
        let defaults = fixture.grass_dir.join("variables").join("defaults");
        for dir in [
            &skel,
            &defaults,
            &fixture.grass_dir.join("global"),
            &fixture.data_from_browser_dir,
            &fixture.tile_dir,
            &fixture.output_dir,
        ] {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(skel.join("VAR"), "DB_DRIVER: sqlite\n").unwrap();
        fs::write(skel.join("SEARCH_PATH"), "PERMANENT\n").unwrap();
        fs::write(defaults.join("attribute_query.ps_param_1"), QUERY_TEMPLATE).unwrap();

        fixture
    }

    pub fn create_permanent(&self) {
        let permanent = self.mapset_dir("PERMANENT");
        fs::create_dir_all(&permanent).unwrap();
        fs::write(permanent.join("WIND"), "proj: 3\nzone: 0\n").unwrap();
    }

    pub fn mapset_dir(&self, name: &str) -> PathBuf {
        self.grass_dir.join("global").join(name)
    }

    /// Drop a file into the browser upload directory.
    pub fn upload(&self, name: &str, content: &str) -> PathBuf {
        let path = self.data_from_browser_dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// File names in the results directory, sorted.
    pub fn outputs(&self) -> Vec<String> {
        list(&self.output_dir)
    }

    pub fn read_output(&self, name: &str) -> String {
        fs::read_to_string(self.output_dir.join(name)).unwrap()
    }

    pub fn tiles(&self) -> Vec<String> {
        list(&self.tile_dir)
    }
}

impl Default for GisFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
