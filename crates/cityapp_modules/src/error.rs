use std::path::PathBuf;
use thiserror::Error;

use cityapp_grass::{GrassError, ToolInvocationError};
use cityapp_protocol::ProtocolError;
use cityapp_report::ReportError;

/// Everything a module step can fail with.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Cannot launch module: {} is not writable.", .path.display())]
    DirectoryNotWritable { path: PathBuf },

    /// Required prior state is missing (e.g. no location defined yet).
    #[error("{0}")]
    Precondition(String),

    #[error(transparent)]
    ToolInvocation(ToolInvocationError),

    #[error("Wrong file format - must be one of {expected}: {file}")]
    UnsupportedFormat { file: String, expected: &'static str },

    /// Bad user input. The dispatcher re-prompts instead of aborting.
    #[error("{0}")]
    Validation(String),

    #[error("no module handles '{0}'")]
    UnknownRoute(String),

    /// Engine problems that are not a tool's nonzero exit.
    #[error(transparent)]
    Engine(GrassError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("session of {module} is unreadable: {source}")]
    Session {
        module: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ModuleError {
    pub fn validation(message: impl Into<String>) -> Self {
        ModuleError::Validation(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        ModuleError::Precondition(message.into())
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ModuleError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ModuleError::Validation(_))
    }

    /// Text for the person driving the wizard. Tool failures show only the
    /// tool's own error block.
    pub fn user_message(&self) -> String {
        match self {
            ModuleError::ToolInvocation(err) => err.diagnostic(),
            ModuleError::Engine(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<GrassError> for ModuleError {
    fn from(err: GrassError) -> Self {
        match err {
            GrassError::ToolInvocation(inner) => ModuleError::ToolInvocation(inner),
            GrassError::DirectoryNotWritable { path } => ModuleError::DirectoryNotWritable { path },
            GrassError::MapsetMissing { name } => {
                ModuleError::Precondition(format!("Mapset {} is missing. Add a location first.", name))
            }
            GrassError::Io { context, source } => ModuleError::Io { context, source },
            other => ModuleError::Engine(other),
        }
    }
}

impl From<ProtocolError> for ModuleError {
    fn from(err: ProtocolError) -> Self {
        ModuleError::UnknownRoute(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ModuleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failures_surface_the_error_block() {
        let err: ModuleError = GrassError::from(ToolInvocationError {
            tool: "v.select".to_string(),
            mapset: "attribute_query".to_string(),
            exit_code: Some(1),
            stderr: "Starting GRASS GIS...\nERROR: Vector map <query_map> not found\n".to_string(),
        })
        .into();

        assert!(matches!(err, ModuleError::ToolInvocation(_)));
        assert_eq!(err.user_message(), "ERROR: Vector map <query_map> not found");
    }

    #[test]
    fn missing_mapset_becomes_precondition() {
        let err: ModuleError = GrassError::MapsetMissing {
            name: "PERMANENT".to_string(),
        }
        .into();
        assert!(matches!(err, ModuleError::Precondition(_)));
        assert!(err.user_message().contains("PERMANENT"));
    }

    #[test]
    fn unwritable_directory_message() {
        let err: ModuleError = GrassError::DirectoryNotWritable {
            path: PathBuf::from("/srv/geoserver/data"),
        }
        .into();
        assert_eq!(
            err.user_message(),
            "Cannot launch module: /srv/geoserver/data is not writable."
        );
    }
}
