//! User-facing load errors.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::touchstone::TouchstoneError;

/// Every way a load can fail, as seen by the presentation layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Touchstone file was not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Unsupported Touchstone file '{}': {reason}", .path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("Touchstone file '{}' is not readable: {reason}", .path.display())]
    ReadError { path: PathBuf, reason: String },

    #[error("{message}")]
    ParseError {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<TouchstoneError>,
    },
}

/// Fieldless mirror of [`LoadError`] for matching and display.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadErrorKind {
    NotFound,
    UnsupportedFormat,
    ReadError,
    ParseError,
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            LoadErrorKind::NotFound => "not found",
            LoadErrorKind::UnsupportedFormat => "unsupported format",
            LoadErrorKind::ReadError => "read error",
            LoadErrorKind::ParseError => "parse error",
        };
        f.write_str(name)
    }
}

impl LoadError {
    pub(crate) fn not_found(path: &Path) -> Self {
        LoadError::NotFound {
            path: path.to_path_buf(),
        }
    }

    pub(crate) fn unsupported(path: &Path, reason: impl Into<String>) -> Self {
        LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn read(path: &Path, reason: impl Into<String>) -> Self {
        LoadError::ReadError {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(path: &Path, message: impl Into<String>) -> Self {
        LoadError::ParseError {
            path: path.to_path_buf(),
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn parse_with_source(
        path: &Path,
        message: impl Into<String>,
        source: TouchstoneError,
    ) -> Self {
        LoadError::ParseError {
            path: path.to_path_buf(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::NotFound { .. } => LoadErrorKind::NotFound,
            LoadError::UnsupportedFormat { .. } => LoadErrorKind::UnsupportedFormat,
            LoadError::ReadError { .. } => LoadErrorKind::ReadError,
            LoadError::ParseError { .. } => LoadErrorKind::ParseError,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            LoadError::NotFound { path }
            | LoadError::UnsupportedFormat { path, .. }
            | LoadError::ReadError { path, .. }
            | LoadError::ParseError { path, .. } => path,
        }
    }

    /// Short text for the headline of an error dialog.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            LoadErrorKind::NotFound => "The selected file does not exist.",
            LoadErrorKind::UnsupportedFormat => {
                "The selected file is not a Touchstone file (.ts, .s1p, .s2p, ...)."
            }
            LoadErrorKind::ReadError => "The selected file could not be read.",
            LoadErrorKind::ParseError => "The selected file could not be parsed.",
        }
    }

    /// Expandable diagnostic text: the path plus the underlying cause.
    pub fn detail(&self) -> String {
        format!("Path: {}\n\nDetails: {}", self.path().display(), self)
    }
}
