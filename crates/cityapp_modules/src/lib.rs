//! CityApp Wizard Modules
//!
//! Each analysis is a small state machine driven by message replies:
//!
//! | Module            | Steps                                      |
//! |-------------------|--------------------------------------------|
//! | `add_location`    | replace? → upload `.osm` → imported        |
//! | `set_selection`   | replace? → draw → saved                    |
//! | `set_resolution`  | number → saved                             |
//! | `add_map`         | upload → name → imported                   |
//! | `attribute_query` | draw area → pick map → predicate → report  |
//!
//! [`Wizard`] routes calls to the modules and keeps their sessions in a
//! caller-owned [`SessionStore`]. Module calls block on the GIS engine and
//! must not overlap for one module or mapset.

pub mod add_location;
pub mod add_map;
pub mod attribute_query;
pub mod context;
pub mod error;
pub mod module;
pub mod session;
pub mod set_resolution;
pub mod set_selection;
pub mod validate;
pub mod wizard;

pub use context::{ModuleContext, Paths};
pub use error::{ModuleError, Result};
pub use module::{Module, Step};
pub use session::{SessionStore, StoredSession};
pub use wizard::Wizard;
