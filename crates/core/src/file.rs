//! File values held by entity fields.

use std::fmt;

use bytes::Bytes;

/// A file stored in a named backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileReference {
    backend: String,
    path: String,
}

impl FileReference {
    /// Create a reference to `path` inside `backend`.
    #[must_use]
    pub fn new(backend: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            path: path.into(),
        }
    }

    /// Backend name.
    #[must_use]
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Path inside the backend.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Filename component of the path.
    #[must_use]
    pub fn filename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.backend, self.path)
    }
}

/// New content not yet copied into any backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original client filename.
    pub filename: String,
    /// MIME type reported by the client.
    pub content_type: Option<String>,
    /// File contents.
    pub contents: Bytes,
}

impl UploadedFile {
    /// Create an upload from a filename and contents.
    #[must_use]
    pub fn new(filename: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            contents: contents.into(),
        }
    }

    /// Set the MIME type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.contents.len()
    }
}

/// Value of a file-bearing entity field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebFile {
    /// Already in a storage backend.
    Stored(FileReference),
    /// Attached by the user, waiting to be copied in.
    Uploaded(UploadedFile),
}

impl WebFile {
    /// Stored reference, if this file lives in a backend.
    #[must_use]
    pub fn as_stored(&self) -> Option<&FileReference> {
        match self {
            Self::Stored(reference) => Some(reference),
            Self::Uploaded(_) => None,
        }
    }

    /// Whether this is a stored file in `backend`.
    #[must_use]
    pub fn is_stored_in(&self, backend: &str) -> bool {
        self.as_stored().is_some_and(|r| r.backend() == backend)
    }

    /// Filename of the file.
    #[must_use]
    pub fn filename(&self) -> &str {
        match self {
            Self::Stored(reference) => reference.filename(),
            Self::Uploaded(upload) => &upload.filename,
        }
    }
}

impl From<FileReference> for WebFile {
    fn from(reference: FileReference) -> Self {
        Self::Stored(reference)
    }
}

impl From<UploadedFile> for WebFile {
    fn from(upload: UploadedFile) -> Self {
        Self::Uploaded(upload)
    }
}

impl fmt::Display for WebFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored(reference) => reference.fmt(f),
            Self::Uploaded(upload) => write!(f, "upload:{}", upload.filename),
        }
    }
}
