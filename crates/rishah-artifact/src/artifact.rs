//! Generated artifact record
//!
//! An [`Artifact`] is one file a generation session wrote into the output
//! directory. Depending on how it was collected it either carries the file
//! content or only a reference to the path.

use crate::vector::is_vector_graphic;
use std::path::{Path, PathBuf};

/// Errors related to artifact construction
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Path does not name a file
    #[error("artifact path has no file name: {0}")]
    InvalidPath(PathBuf),
}

/// Artifact payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactContent {
    /// Decoded text read from disk (invalid UTF-8 replaced)
    Text(String),
    /// Only the path is known
    Reference,
}

/// A file produced by a generation session
///
/// # Invariants
/// - `file_name` is the final component of `path`
/// - `is_vector` is derived once at construction
/// - Immutable after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    file_name: String,
    content: ArtifactContent,
    is_vector: bool,
}

impl Artifact {
    /// Create an artifact from bytes read off disk
    ///
    /// Classifies by file name and by sniffing the content.
    ///
    /// # Errors
    /// Returns error if `path` has no file name
    pub fn with_content(path: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self, ArtifactError> {
        let path = path.into();
        let file_name = file_name_of(&path)?;
        let text = String::from_utf8_lossy(bytes).into_owned();
        let is_vector = is_vector_graphic(&file_name, Some(&text));

        Ok(Self {
            path,
            file_name,
            content: ArtifactContent::Text(text),
            is_vector,
        })
    }

    /// Create a path-only artifact
    ///
    /// Classification uses the file name alone.
    ///
    /// # Errors
    /// Returns error if `path` has no file name
    pub fn reference(path: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let path = path.into();
        let file_name = file_name_of(&path)?;
        let is_vector = is_vector_graphic(&file_name, None);

        Ok(Self {
            path,
            file_name,
            content: ArtifactContent::Reference,
            is_vector,
        })
    }

    /// Full path of the file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Content or reference
    #[inline]
    #[must_use]
    pub fn content(&self) -> &ArtifactContent {
        &self.content
    }

    /// Text content, if it was read
    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            ArtifactContent::Text(text) => Some(text),
            ArtifactContent::Reference => None,
        }
    }

    /// Whether this artifact is a vector graphic
    #[inline]
    #[must_use]
    pub fn is_vector(&self) -> bool {
        self.is_vector
    }
}

fn file_name_of(path: &Path) -> Result<String, ArtifactError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ArtifactError::InvalidPath(path.to_path_buf()))
}
