//! Location, selection, resolution and map import modules.

use std::fs;
use std::sync::Arc;

use cityapp_modules::{ModuleContext, ModuleError, Paths, SessionStore, Wizard};
use cityapp_protocol::{ModuleKind, Reply};
use cityapp_test_utils::{CopyDocumentTools, GisFixture, ScriptedEngine};

fn wizard(fixture: &GisFixture, engine: &Arc<ScriptedEngine>) -> Wizard {
    let paths = Paths {
        data_from_browser_dir: fixture.data_from_browser_dir.clone(),
        geoserver_data_dir: fixture.geoserver_data_dir.clone(),
        grass_dir: fixture.grass_dir.clone(),
        output_dir: fixture.output_dir.clone(),
    };
    Wizard::new(ModuleContext::new(
        paths,
        engine.clone(),
        Arc::new(CopyDocumentTools::new()),
    ))
}

fn engine_for(fixture: &GisFixture) -> Arc<ScriptedEngine> {
    Arc::new(ScriptedEngine::new().with_gis_root(&fixture.grass_dir))
}

fn text_field<'a>(msg: &'a cityapp_protocol::Message, key: &str) -> Option<&'a str> {
    msg.field(key).and_then(|v| v.as_str())
}

// ----------------------------------------------------------------------------
// add_map
// ----------------------------------------------------------------------------

#[test]
fn add_map_without_location_acknowledges_and_stops() {
    let fixture = GisFixture::without_permanent();
    let engine = engine_for(&fixture);
    let wizard = wizard(&fixture, &engine);
    let mut store = SessionStore::new();

    let msg = wizard.launch(&mut store, "add_map").unwrap();
    assert_eq!(msg.message_id.to_string(), "add_map.1");
    assert!(wizard
        .reply(&mut store, "add_map.1", Reply::text("ok"))
        .unwrap()
        .is_none());
}

#[test]
fn add_map_imports_and_exports_a_vector() {
    let fixture = GisFixture::new();
    let engine = engine_for(&fixture);
    let wizard = wizard(&fixture, &engine);
    let mut store = SessionStore::new();

    assert_eq!(
        wizard.launch(&mut store, "add_map").unwrap().message_id.to_string(),
        "add_map.2"
    );
    let upload = fixture.upload("Parks.GeoJSON", "{}");
    let ask_name = wizard
        .reply(&mut store, "add_map.2", Reply::file(&upload))
        .unwrap()
        .unwrap();
    assert_eq!(ask_name.message_id.to_string(), "add_map.3");
    assert_eq!(text_field(&ask_name, "layerName"), Some("Parks"));

    let done = wizard
        .reply(&mut store, "add_map.3", Reply::text("parks"))
        .unwrap()
        .unwrap();
    assert_eq!(done.message_id.to_string(), "add_map.4");

    let import = &engine.calls_to("v.import")[0];
    assert_eq!(import.mapset, "PERMANENT");
    assert_eq!(import.command.get("output"), Some("parks"));
    assert_eq!(import.command.get("input"), Some(upload.to_str().unwrap()));
    assert_eq!(fixture.tiles(), vec!["parks.gpkg"]);
}

#[test]
fn add_map_imports_raster_without_export() {
    let fixture = GisFixture::new();
    let engine = engine_for(&fixture);
    let wizard = wizard(&fixture, &engine);
    let mut store = SessionStore::new();

    wizard.launch(&mut store, "add_map").unwrap();
    let upload = fixture.upload("dem.tif", "II*");
    wizard
        .reply(&mut store, "add_map.2", Reply::file(upload))
        .unwrap();
    wizard
        .reply(&mut store, "add_map.3", Reply::text("dem"))
        .unwrap();

    assert_eq!(engine.tools(), vec!["r.import"]);
}

#[test]
fn add_map_rejects_unknown_format_and_bad_names() {
    let fixture = GisFixture::new();
    let engine = engine_for(&fixture);
    let wizard = wizard(&fixture, &engine);
    let mut store = SessionStore::new();

    wizard.launch(&mut store, "add_map").unwrap();
    let err = wizard
        .reply(&mut store, "add_map.2", Reply::file(fixture.upload("notes.txt", "")))
        .unwrap_err();
    assert!(matches!(err, ModuleError::UnsupportedFormat { .. }));
    assert_eq!(store.current_step(ModuleKind::AddMap), Some(2));

    wizard
        .reply(&mut store, "add_map.2", Reply::file(fixture.upload("roads.gpkg", "")))
        .unwrap();
    let again = wizard
        .reply(&mut store, "add_map.3", Reply::text("2roads"))
        .unwrap()
        .unwrap();
    assert_eq!(again.message_id.to_string(), "add_map.3");
    assert!(again.field("error").is_some());
    assert_eq!(text_field(&again, "layerName"), Some("roads"));
    assert!(engine.calls().is_empty());
}

#[test]
fn add_map_requires_writable_tile_dir() {
    let fixture = GisFixture::new();
    fs::remove_dir_all(&fixture.tile_dir).unwrap();
    let engine = engine_for(&fixture);
    let wizard = wizard(&fixture, &engine);

    let err = wizard
        .launch(&mut SessionStore::new(), "add_map")
        .unwrap_err();
    assert!(matches!(err, ModuleError::DirectoryNotWritable { .. }));
    assert!(err.user_message().starts_with("Cannot launch module:"));
}

#[test]
fn upload_modules_require_the_browser_data_dir() {
    let fixture = GisFixture::new();
    fs::remove_dir_all(&fixture.data_from_browser_dir).unwrap();
    let engine = engine_for(&fixture);
    let wizard = wizard(&fixture, &engine);

    for module in ["add_location", "set_selection", "add_map", "attribute_query"] {
        let mut store = SessionStore::new();
        let err = wizard.launch(&mut store, module).unwrap_err();
        assert!(
            matches!(err, ModuleError::DirectoryNotWritable { ref path } if *path == fixture.data_from_browser_dir),
            "{module}: {err:?}"
        );
        assert!(store.is_empty());
    }
    assert!(engine.calls().is_empty());
}

// ----------------------------------------------------------------------------
// add_location
// ----------------------------------------------------------------------------

#[test]
fn add_location_creates_location_and_imports_osm_layers() {
    let fixture = GisFixture::without_permanent();
    let engine = engine_for(&fixture);
    engine
        .on("g.region")
        .returns("center_easting=19.0402\ncenter_northing=47.4979\n");
    let wizard = wizard(&fixture, &engine);
    let mut store = SessionStore::new();

    let first = wizard.launch(&mut store, "add_location").unwrap();
    assert_eq!(first.message_id.to_string(), "add_location.4");

    let osm = fixture.upload("budapest.osm", "<osm/>");
    let done = wizard
        .reply(&mut store, "add_location.4", Reply::file(&osm))
        .unwrap()
        .unwrap();

    assert_eq!(done.message_id.to_string(), "add_location.5");
    assert_eq!(text_field(&done, "lat"), Some("47.4979"));
    assert_eq!(text_field(&done, "lon"), Some("19.0402"));
    assert_eq!(engine.locations_created(), vec![("PERMANENT".to_string(), osm)]);
    assert!(fixture.mapset_dir("PERMANENT").join("WIND").is_file());

    let layers: Vec<String> = engine
        .calls_to("v.in.ogr")
        .iter()
        .map(|c| c.command.get("output").unwrap().to_string())
        .collect();
    assert_eq!(layers, vec!["points_osm", "lines_osm", "polygons_osm", "relations_osm"]);
    assert_eq!(
        fixture.tiles(),
        vec!["lines_osm.gpkg", "points_osm.gpkg", "polygons_osm.gpkg", "relations_osm.gpkg"]
    );
}

#[test]
fn add_location_replacement_drops_stale_selection() {
    let fixture = GisFixture::new();
    let engine = engine_for(&fixture);
    engine.on("g.list").returns("lines_osm\nselection\n");
    engine
        .on("g.region")
        .returns("center_easting=1\ncenter_northing=2\n");
    let wizard = wizard(&fixture, &engine);
    let mut store = SessionStore::new();

    let first = wizard.launch(&mut store, "add_location").unwrap();
    assert_eq!(first.message_id.to_string(), "add_location.1");
    let next = wizard
        .reply(&mut store, "add_location.1", Reply::text("yes"))
        .unwrap()
        .unwrap();
    assert_eq!(next.message_id.to_string(), "add_location.4");

    wizard
        .reply(&mut store, "add_location.4", Reply::file(fixture.upload("new.osm", "")))
        .unwrap();

    assert!(engine.locations_created().is_empty());
    let removed = &engine.calls_to("g.remove")[0].command;
    assert_eq!(removed.get("name"), Some("selection"));
}

#[test]
fn add_location_can_be_declined_and_needs_osm() {
    let fixture = GisFixture::new();
    let engine = engine_for(&fixture);
    let wizard = wizard(&fixture, &engine);
    let mut store = SessionStore::new();

    wizard.launch(&mut store, "add_location").unwrap();
    let kept = wizard
        .reply(&mut store, "add_location.1", Reply::text("no"))
        .unwrap()
        .unwrap();
    assert_eq!(kept.message_id.to_string(), "add_location.3");

    wizard.launch(&mut store, "add_location").unwrap();
    wizard
        .reply(&mut store, "add_location.1", Reply::text("yes"))
        .unwrap();
    let err = wizard
        .reply(&mut store, "add_location.4", Reply::file(fixture.upload("a.geojson", "")))
        .unwrap_err();
    assert!(matches!(err, ModuleError::UnsupportedFormat { .. }));
    assert!(engine.calls().is_empty());
}

// ----------------------------------------------------------------------------
// set_selection
// ----------------------------------------------------------------------------

#[test]
fn set_selection_requires_location() {
    let fixture = GisFixture::without_permanent();
    let engine = engine_for(&fixture);
    let err = wizard(&fixture, &engine)
        .launch(&mut SessionStore::new(), "set_selection")
        .unwrap_err();
    assert!(matches!(err, ModuleError::Precondition(_)));
}

#[test]
fn set_selection_saves_drawing() {
    let fixture = GisFixture::new();
    let engine = engine_for(&fixture);
    engine
        .on("g.region")
        .param("vector", "selection")
        .returns("center_easting=19.1\ncenter_northing=47.5\n");
    let wizard = wizard(&fixture, &engine);
    let mut store = SessionStore::new();

    let first = wizard.launch(&mut store, "set_selection").unwrap();
    assert_eq!(first.message_id.to_string(), "set_selection.2");

    let done = wizard
        .reply(
            &mut store,
            "set_selection.2",
            Reply::file(fixture.upload("drawing.geojson", "{}")),
        )
        .unwrap()
        .unwrap();
    assert_eq!(done.message_id.to_string(), "set_selection.3");
    assert_eq!(text_field(&done, "lat"), Some("47.5"));
    assert_eq!(fixture.tiles(), vec!["selection.gpkg"]);
}

#[test]
fn set_selection_asks_before_replacing() {
    let fixture = GisFixture::new();
    let engine = engine_for(&fixture);
    engine.on("g.list").returns("selection\n");
    let wizard = wizard(&fixture, &engine);
    let mut store = SessionStore::new();

    let first = wizard.launch(&mut store, "set_selection").unwrap();
    assert_eq!(first.message_id.to_string(), "set_selection.1");
    let kept = wizard
        .reply(&mut store, "set_selection.1", Reply::text("No"))
        .unwrap()
        .unwrap();
    assert_eq!(kept.message_id.to_string(), "set_selection.4");
}

// ----------------------------------------------------------------------------
// set_resolution
// ----------------------------------------------------------------------------

#[test]
fn set_resolution_reprompts_then_stores_value() {
    let fixture = GisFixture::new();
    let engine = engine_for(&fixture);
    let wizard = wizard(&fixture, &engine);
    let mut store = SessionStore::new();

    wizard.launch(&mut store, "set_resolution").unwrap();
    let again = wizard
        .reply(&mut store, "set_resolution.1", Reply::text("-10"))
        .unwrap()
        .unwrap();
    assert_eq!(again.message_id.to_string(), "set_resolution.2");

    let done = wizard
        .reply(&mut store, "set_resolution.2", Reply::text("30"))
        .unwrap()
        .unwrap();
    assert_eq!(done.message_id.to_string(), "set_resolution.3");
    assert_eq!(
        fs::read_to_string(fixture.grass_dir.join("variables").join("resolution")).unwrap(),
        "30\n"
    );
}

// ----------------------------------------------------------------------------
// wizard services
// ----------------------------------------------------------------------------

#[test]
fn unknown_module_cannot_be_launched() {
    let fixture = GisFixture::new();
    let engine = engine_for(&fixture);
    let err = wizard(&fixture, &engine)
        .launch(&mut SessionStore::new(), "module_1")
        .unwrap_err();
    assert!(matches!(err, ModuleError::UnknownRoute(_)));
}

#[test]
fn results_are_listed_sorted() {
    let fixture = GisFixture::new();
    for name in ["query_results_2024-02-01_1000.pdf", "query_results_2024-01-01_0900.pdf"] {
        fs::write(fixture.output_dir.join(name), "%PDF").unwrap();
    }
    let engine = engine_for(&fixture);

    assert_eq!(
        wizard(&fixture, &engine).list_results().unwrap(),
        vec![
            "query_results_2024-01-01_0900.pdf",
            "query_results_2024-02-01_1000.pdf"
        ]
    );
}

#[test]
fn describe_table_runs_against_permanent() {
    let fixture = GisFixture::new();
    let engine = engine_for(&fixture);
    engine
        .on("db.describe")
        .returns("table:parks\nncols:2\n\ncolumn:cat\ntype:INTEGER\n\ncolumn:area\ntype:DOUBLE PRECISION\n");
    engine.on("v.db.univar").returns("n=2\nmin=0.005\nmax=14.999\n");

    let desc = wizard(&fixture, &engine).describe_table("parks").unwrap();

    let area = desc.column("area").unwrap();
    assert_eq!(area.get("min"), Some("0.00"));
    assert_eq!(area.get("max"), Some("14.99"));
    assert_eq!(desc.columns.head_fields.len(), 2 + 2);
    assert!(engine.calls().iter().all(|c| c.mapset == "PERMANENT"));
}
