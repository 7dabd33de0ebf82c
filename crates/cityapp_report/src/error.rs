use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("document tool '{0}' not found on PATH")]
    ToolNotFound(String),

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{tool} reported success but wrote no {}", .output.display())]
    MissingOutput { tool: String, output: PathBuf },

    #[error("report has no pages")]
    Empty,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ReportError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
