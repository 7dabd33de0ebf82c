//! [`DocumentTools`] that copy text around instead of rendering.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use cityapp_report::{DocumentTools, ReportError, Result};

/// Separator written between merged pages.
pub const PAGE_BREAK: &str = "\n%%PAGE-BREAK%%\n";

/// Each conversion prefixes a marker and copies the input, so a merged
/// "PDF" is the readable concatenation of every page.
#[derive(Debug, Default)]
pub struct CopyDocumentTools {
    fail_merge: AtomicBool,
    scratch_dirs: Mutex<Vec<PathBuf>>,
}

impl CopyDocumentTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next merges fail like a broken `gs`.
    pub fn fail_merges(&self) {
        self.fail_merge.store(true, Ordering::SeqCst);
    }

    /// Directories the intermediate files were written to.
    pub fn scratch_dirs(&self) -> Vec<PathBuf> {
        self.scratch_dirs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn convert(&self, input: &Path, output: &Path, marker: &str) -> Result<()> {
        if let Some(parent) = output.parent() {
            let mut dirs = self.scratch_dirs.lock().unwrap_or_else(PoisonError::into_inner);
            if !dirs.iter().any(|d| d == parent) {
                dirs.push(parent.to_path_buf());
            }
        }
        let body = fs::read_to_string(input)
            .map_err(|e| ReportError::Io { context: format!("read {}", input.display()), source: e })?;
        fs::write(output, format!("{}\n{}", marker, body))
            .map_err(|e| ReportError::Io { context: format!("write {}", output.display()), source: e })
    }
}

impl DocumentTools for CopyDocumentTools {
    fn text_to_ps(&self, input: &Path, output: &Path) -> Result<()> {
        self.convert(input, output, "%!PS enscript")
    }

    fn ps_to_pdf(&self, input: &Path, output: &Path) -> Result<()> {
        self.convert(input, output, "%PDF ps2pdf")
    }

    fn merge_pdfs(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        if self.fail_merge.load(Ordering::SeqCst) {
            return Err(ReportError::ToolFailed {
                tool: "gs".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Error: /undefined in merge".to_string(),
            });
        }
        let mut pages = Vec::with_capacity(inputs.len());
        for input in inputs {
            pages.push(
                fs::read_to_string(input)
                    .map_err(|e| ReportError::Io { context: format!("read {}", input.display()), source: e })?,
            );
        }
        fs::write(output, pages.join(PAGE_BREAK))
            .map_err(|e| ReportError::Io { context: format!("write {}", output.display()), source: e })
    }
}
