//! Report Assembly
//!
//! Turns analysis output into one downloadable PDF:
//! plain text and rendered maps are converted page by page inside a scratch
//! directory, merged, and only then moved into the results directory.

pub mod assembler;
pub mod error;
pub mod tools;

pub use assembler::{list_reports, report_file_name, ReportAssembler};
pub use error::{ReportError, Result};
pub use tools::{DocumentTools, GhostscriptTools};
