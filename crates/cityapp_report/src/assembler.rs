use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{ReportError, Result};
use crate::tools::DocumentTools;

/// `<prefix>_<YYYY-MM-DD_HHMM>.pdf`, UTC.
pub fn report_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}.pdf", prefix, at.format("%Y-%m-%d_%H%M"))
}

/// Finished reports in `dir`, sorted by name. Hidden and partial files are
/// skipped.
pub fn list_reports(dir: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(dir).map_err(|e| ReportError::io(format!("read {}", dir.display()), e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ReportError::io(format!("read {}", dir.display()), e))?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name.ends_with(".part") {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Collects PDF pages in a scratch directory and merges them into one
/// document.
///
/// The scratch directory is removed when the assembler is dropped, whether
/// or not [`finish`](Self::finish) was reached.
pub struct ReportAssembler {
    tools: Arc<dyn DocumentTools>,
    scratch: TempDir,
    pages: Vec<PathBuf>,
}

impl ReportAssembler {
    pub fn new(tools: Arc<dyn DocumentTools>) -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("cityapp-report-")
            .tempdir()
            .map_err(|e| ReportError::io("create report scratch directory", e))?;
        debug!(scratch = %scratch.path().display(), "report scratch created");
        Ok(Self {
            tools,
            scratch,
            pages: Vec::new(),
        })
    }

    /// A path inside the scratch directory, for callers that render pages
    /// themselves (e.g. `ps.map`).
    pub fn scratch_path(&self, name: &str) -> PathBuf {
        self.scratch.path().join(name)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Add a plain text page (text → PostScript → PDF).
    pub fn add_text_page(&mut self, text: &str) -> Result<()> {
        let stem = self.next_stem();
        let txt = self.scratch_path(&format!("{}.txt", stem));
        let ps = self.scratch_path(&format!("{}.ps", stem));
        fs::write(&txt, text).map_err(|e| ReportError::io(format!("write {}", txt.display()), e))?;

        self.tools.text_to_ps(&txt, &ps)?;
        self.add_postscript_page(&ps)
    }

    pub fn add_postscript_page(&mut self, ps: &Path) -> Result<()> {
        let pdf = self.scratch_path(&format!("{}.pdf", self.next_stem()));
        self.tools.ps_to_pdf(ps, &pdf)?;
        self.pages.push(pdf);
        Ok(())
    }

    /// Merge the pages and move the result to `dest`.
    ///
    /// `dest` only appears once the merged document is complete: it is
    /// renamed into place, or copied to a `.part` sibling and renamed when
    /// scratch and destination are on different filesystems.
    pub fn finish(self, dest: &Path) -> Result<PathBuf> {
        if self.pages.is_empty() {
            return Err(ReportError::Empty);
        }

        let merged = self.scratch_path("merged.pdf");
        self.tools.merge_pdfs(&self.pages, &merged)?;
        persist(&merged, dest)?;

        info!(pages = self.pages.len(), "report written to {}", dest.display());
        Ok(dest.to_path_buf())
    }

    fn next_stem(&self) -> String {
        format!("page_{:02}", self.pages.len() + 1)
    }
}

fn persist(from: &Path, dest: &Path) -> Result<()> {
    if fs::rename(from, dest).is_ok() {
        return Ok(());
    }

    let mut partial = dest.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    fs::copy(from, &partial)
        .map_err(|e| ReportError::io(format!("copy report to {}", partial.display()), e))?;
    fs::rename(&partial, dest).map_err(|e| {
        let _ = fs::remove_file(&partial);
        ReportError::io(format!("move report to {}", dest.display()), e)
    })
}
