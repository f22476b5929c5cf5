//! Source loading utilities
//!
//! [`SourceLoader`] reads script text from a file or takes it from a string.
//! The runner, the extractor and the checker all go through it so that read
//! failures are reported the same way everywhere.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Error that can occur when loading sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    /// The file could not be read
    Io { path: PathBuf, message: String },
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderError::Io { path, message } => {
                write!(f, "cannot read {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for LoaderError {}

/// Script source plus the path it came from, if any
#[derive(Debug, Clone)]
pub struct SourceLoader {
    source: String,
    path: Option<PathBuf>,
}

impl SourceLoader {
    /// Load from a file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|err| LoaderError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        log::debug!("loaded {} ({} bytes)", path.display(), source.len());
        Ok(SourceLoader {
            source,
            path: Some(path.to_path_buf()),
        })
    }

    /// Load from a string
    pub fn from_string<S: Into<String>>(source: S) -> Self {
        SourceLoader {
            source: source.into(),
            path: None,
        }
    }

    /// Get a reference to the raw source string
    pub fn source_ref(&self) -> &str {
        &self.source
    }

    /// Consume the loader, keeping only the text
    pub fn into_source(self) -> String {
        self.source
    }

    /// The file the source was read from, `None` for in-memory sources
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
