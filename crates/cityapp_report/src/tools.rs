//! External document converters.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

use crate::error::{ReportError, Result};

/// Conversions the report pipeline needs. Every call writes `output` or
/// fails.
pub trait DocumentTools: Send + Sync {
    /// Plain text to PostScript.
    fn text_to_ps(&self, input: &Path, output: &Path) -> Result<()>;

    fn ps_to_pdf(&self, input: &Path, output: &Path) -> Result<()>;

    /// Concatenate PDFs in the given order.
    fn merge_pdfs(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;
}

/// `enscript`, `ps2pdf` and `gs` as installed on the host.
#[derive(Debug, Clone)]
pub struct GhostscriptTools {
    enscript: PathBuf,
    ps2pdf: PathBuf,
    gs: PathBuf,
}

impl GhostscriptTools {
    pub fn new(enscript: impl Into<PathBuf>, ps2pdf: impl Into<PathBuf>, gs: impl Into<PathBuf>) -> Self {
        Self {
            enscript: enscript.into(),
            ps2pdf: ps2pdf.into(),
            gs: gs.into(),
        }
    }

    /// Resolve all three tools on PATH.
    pub fn discover() -> Result<Self> {
        Ok(Self::new(find("enscript")?, find("ps2pdf")?, find("gs")?))
    }
}

fn find(tool: &str) -> Result<PathBuf> {
    which::which(tool).map_err(|_| ReportError::ToolNotFound(tool.to_string()))
}

/// Run a converter and make sure it produced `output`.
fn run(program: &Path, command: &mut Command, output: &Path) -> Result<()> {
    let tool = program
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());
    info!("{} -> {}", tool, output.display());

    let result = command.output().map_err(|source| ReportError::Spawn {
        tool: tool.clone(),
        source,
    })?;

    if !result.status.success() {
        return Err(ReportError::ToolFailed {
            tool,
            status: result.status.to_string(),
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        });
    }
    if !output.is_file() {
        return Err(ReportError::MissingOutput {
            tool,
            output: output.to_path_buf(),
        });
    }
    Ok(())
}

impl DocumentTools for GhostscriptTools {
    fn text_to_ps(&self, input: &Path, output: &Path) -> Result<()> {
        run(
            &self.enscript,
            Command::new(&self.enscript).arg("-p").arg(output).arg(input),
            output,
        )
    }

    fn ps_to_pdf(&self, input: &Path, output: &Path) -> Result<()> {
        run(
            &self.ps2pdf,
            Command::new(&self.ps2pdf).arg(input).arg(output),
            output,
        )
    }

    fn merge_pdfs(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        let mut out_arg = std::ffi::OsString::from("-sOutputFile=");
        out_arg.push(output);
        run(
            &self.gs,
            Command::new(&self.gs)
                .args([
                    "-dBATCH",
                    "-dNOPAUSE",
                    "-q",
                    "-sDEVICE=pdfwrite",
                    "-dPDFSETTINGS=/prepress",
                ])
                .arg(out_arg)
                .args(inputs),
            output,
        )
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn enscript_gets_output_before_input() {
        let dir = tempfile::tempdir().unwrap();
        // enscript -p OUT IN
        let enscript = script(dir.path(), "enscript", r#"cp "$3" "$2""#);
        let tools = GhostscriptTools::new(enscript, "/bin/false", "/bin/false");

        let input = dir.path().join("stats.txt");
        let output = dir.path().join("stats.ps");
        std::fs::write(&input, "Results:\n").unwrap();

        tools.text_to_ps(&input, &output).unwrap();
        assert_eq!(std::fs::read_to_string(output).unwrap(), "Results:\n");
    }

    #[test]
    fn gs_receives_output_flag_then_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let gs = script(
            dir.path(),
            "gs",
            r#"out=""; for a in "$@"; do case "$a" in -sOutputFile=*) out="${a#-sOutputFile=}";; esac; done; printf '%s\n' "$@" > "$out""#,
        );
        let tools = GhostscriptTools::new("/bin/false", "/bin/false", gs);

        let output = dir.path().join("merged.pdf");
        let inputs = vec![PathBuf::from("/s/a.pdf"), PathBuf::from("/s/b.pdf")];
        tools.merge_pdfs(&inputs, &output).unwrap();

        let args: Vec<String> = std::fs::read_to_string(&output)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        assert_eq!(&args[..5], ["-dBATCH", "-dNOPAUSE", "-q", "-sDEVICE=pdfwrite", "-dPDFSETTINGS=/prepress"]);
        assert_eq!(args[5], format!("-sOutputFile={}", output.display()));
        assert_eq!(&args[6..], ["/s/a.pdf", "/s/b.pdf"]);
    }

    #[test]
    fn failing_tool_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let ps2pdf = script(dir.path(), "ps2pdf", "echo 'Unrecoverable error' >&2\nexit 1");
        let tools = GhostscriptTools::new("/bin/false", ps2pdf, "/bin/false");

        let err = tools
            .ps_to_pdf(&dir.path().join("in.ps"), &dir.path().join("out.pdf"))
            .unwrap_err();
        match err {
            ReportError::ToolFailed { tool, stderr, .. } => {
                assert_eq!(tool, "ps2pdf");
                assert_eq!(stderr, "Unrecoverable error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn silent_tool_without_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ps2pdf = script(dir.path(), "ps2pdf", "exit 0");
        let tools = GhostscriptTools::new("/bin/false", ps2pdf, "/bin/false");

        let err = tools
            .ps_to_pdf(&dir.path().join("in.ps"), &dir.path().join("out.pdf"))
            .unwrap_err();
        assert!(matches!(err, ReportError::MissingOutput { .. }));
    }
}
