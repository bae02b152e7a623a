//! Error types for the dataset viewer core.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the store, the codecs and the settings surface.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// One or more dataset names are not open in the store.
    #[error("dataset not found: {}", names.join(", "))]
    NotFound { names: Vec<String> },

    /// Input could not be parsed as a table.
    #[error("failed to parse {source_name}: {message}")]
    Format {
        source_name: String,
        message: String,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("unknown setting '{0}'")]
    UnknownSetting(String),

    #[error("invalid value '{value}' for setting '{key}'")]
    InvalidSetting { key: String, value: String },

    /// An event arrived while the synchronizer was still applying another one.
    #[error("view synchronizer is busy")]
    SyncBusy,
}

impl ViewerError {
    pub fn not_found(name: impl Into<String>) -> Self {
        ViewerError::NotFound {
            names: vec![name.into()],
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ViewerError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(source_name: impl Into<String>, message: impl ToString) -> Self {
        ViewerError::Format {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Short message suitable for the status line.
    pub fn user_message(&self) -> String {
        match self {
            ViewerError::NotFound { names } if names.len() == 1 => {
                format!("No dataset named '{}'", names[0])
            }
            ViewerError::Format { source_name, .. } => {
                format!("Could not read {} as a table", source_name)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_all_names() {
        let err = ViewerError::NotFound {
            names: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "dataset not found: a, b");
    }

    #[test]
    fn test_user_message_single_name() {
        let err = ViewerError::not_found("sales");
        assert_eq!(err.user_message(), "No dataset named 'sales'");
    }
}
