//! CityApp Test Utilities
//!
//! Doubles for the two external process boundaries plus a throwaway GIS
//! directory tree.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cityapp_test_utils::{CopyDocumentTools, GisFixture, ScriptedEngine};
//!
//! let fixture = GisFixture::new();
//! let engine = ScriptedEngine::new().with_gis_root(&fixture.grass_dir);
//! engine.on("g.list").returns("buildings\n");
//! engine.on("db.describe").flag("c").param("table", "buildings")
//!     .returns("Column 1: cat:INTEGER:20\nColumn 2: height:DOUBLE PRECISION:20\n");
//!
//! // ... drive the wizard ...
//!
//! assert_eq!(engine.tools().last().map(String::as_str), Some("ps.map"));
//! ```

pub mod documents;
pub mod engine;
pub mod fixture;

pub use documents::{CopyDocumentTools, PAGE_BREAK};
pub use engine::{EngineCall, ScriptedEngine};
pub use fixture::{GisFixture, QUERY_TEMPLATE};
