use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The engine exited with a nonzero status.
///
/// `stderr` keeps the raw diagnostic text (banner included) so callers can
/// pull the tool's own `ERROR:` block out with [`diagnostic`](Self::diagnostic).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocationError {
    pub tool: String,
    pub mapset: String,
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl fmt::Display for ToolInvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed in mapset '{}' (", self.tool, self.mapset)?;
        match self.exit_code {
            Some(code) => write!(f, "exit code {}", code)?,
            None => f.write_str("terminated by signal")?,
        }
        write!(f, "): {}", self.diagnostic())
    }
}

impl std::error::Error for ToolInvocationError {}

impl ToolInvocationError {
    /// The tool's error block, or the trimmed raw text when it printed none.
    pub fn diagnostic(&self) -> String {
        extract_error_block(&self.stderr).unwrap_or_else(|| self.stderr.trim().to_string())
    }
}

/// Collect the `ERROR` block of GRASS diagnostic output.
///
/// Capture starts at a line beginning with `ERROR` and continues through
/// indented continuation lines; any other line ends it. Captured lines are
/// joined with single spaces.
pub fn extract_error_block(raw: &str) -> Option<String> {
    let mut captured: Vec<&str> = Vec::new();
    let mut ongoing = false;

    for line in raw.lines() {
        let is_error = line.starts_with("ERROR");
        if is_error {
            ongoing = true;
        } else if !line.starts_with(char::is_whitespace) {
            ongoing = false;
        }
        if ongoing {
            captured.push(line.trim());
        }
    }

    if captured.is_empty() {
        None
    } else {
        Some(captured.join(" "))
    }
}

/// Errors raised by the gateway, parsers and mapset manager.
#[derive(Debug, Error)]
pub enum GrassError {
    #[error(transparent)]
    ToolInvocation(#[from] ToolInvocationError),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("GRASS executable not found: {0}")]
    EngineNotFound(String),

    #[error("{} is not writable", .path.display())]
    DirectoryNotWritable { path: PathBuf },

    #[error("mapset '{name}' does not exist")]
    MapsetMissing { name: String },

    #[error("could not parse {tool} output: {message}")]
    Parse { tool: String, message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl GrassError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        GrassError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn parse(tool: &str, message: impl Into<String>) -> Self {
        GrassError::Parse {
            tool: tool.to_string(),
            message: message.into(),
        }
    }

    /// Text suitable for showing to the person driving the wizard.
    pub fn user_message(&self) -> String {
        match self {
            GrassError::ToolInvocation(err) => err.diagnostic(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GrassError>;
