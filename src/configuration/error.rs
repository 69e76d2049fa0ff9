use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;


/// Everything that can go wrong while loading or reading the configuration.
///
/// None of these are recoverable: configuration is loaded once per process,
/// so callers are expected to abort startup (or the operation that first
/// needed a deferred field) and surface the message.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigurationError {
    /// The document is structurally invalid or carries a value of the wrong type.
    #[error("Failed to parse configuration: {message}")]
    #[diagnostic(code(mail2workitem::parse))]
    Parse { message: String },

    /// The document parsed, but is semantically incomplete or inconsistent.
    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(mail2workitem::validation))]
    Validation { message: String },

    /// A file-backed field was accessed, but its path is empty or unset.
    #[error("Field {field} does not contain a file path.")]
    #[diagnostic(
        code(mail2workitem::argument),
        help("Set {field} to the path of a readable text file.")
    )]
    Argument { field: String },

    /// The configuration could not be written back out as a document.
    #[error("Failed to serialize configuration: {message}")]
    #[diagnostic(code(mail2workitem::serialization))]
    Serialization { message: String },

    #[error("Failed to read {}.", path.display())]
    #[diagnostic(code(mail2workitem::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigurationError {
    pub(crate) fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub(crate) fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}
