//! GRASS GIS Gateway
//!
//! Everything that touches the external geoprocessing engine:
//! - [`gateway`]: the [`Engine`] seam and the process-backed [`GrassCli`]
//! - [`command`]: structured command lines (no shell involved)
//! - [`parse`]: typed views over the engine's textual output
//! - [`ops`]: the engine operations the wizard modules use
//! - [`mapset`]: on-disk mapset layout, creation and writability checks
//!
//! The engine keeps region and mask state per mapset, so commands against
//! one mapset must never run concurrently. Nothing here locks; callers
//! serialize.

pub mod command;
pub mod error;
pub mod gateway;
pub mod mapset;
pub mod ops;
pub mod parse;

pub use command::GrassCommand;
pub use error::{GrassError, Result, ToolInvocationError};
pub use gateway::{Engine, GrassCli};
pub use mapset::{ensure_writable, GisLayout, MapsetManager, PERMANENT};
pub use ops::GisOps;
pub use parse::{ColumnInfo, StatKey, Topology, TopologyCounts, UnivariateStats};
