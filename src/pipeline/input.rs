//! Input resolution: turn a path or an in-memory upload into an
//! [`UploadedDocument`] with a known [`MediaType`].
//!
//! The media type is either declared by the caller (a MIME string from an
//! upload form, or a short tag like `pdf`) or, for files on disk, derived from
//! the extension. Content is not sniffed: a mislabelled
//! file fails in the reader with a format-specific error instead.

use crate::error::RfpError;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// The document containers the reader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Pdf,
    Html,
    PlainText,
}

impl MediaType {
    /// Parse a declared media type.
    ///
    /// Accepts MIME types (`application/pdf`, `text/html`, `text/plain`,
    /// parameters such as `; charset=utf-8` ignored) and short tags
    /// (`pdf`, `html`, `htm`, `txt`, `text`, `plain-text`), case-insensitively.
    pub fn from_tag(tag: &str) -> Result<Self, RfpError> {
        let essence = tag
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/pdf" | "pdf" => Ok(MediaType::Pdf),
            "text/html" | "application/xhtml+xml" | "html" | "htm" => Ok(MediaType::Html),
            "text/plain" | "txt" | "text" | "plain-text" => Ok(MediaType::PlainText),
            _ => Err(RfpError::UnsupportedFormat {
                media_type: tag.to_string(),
            }),
        }
    }

    /// Derive the media type from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, RfpError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_tag(ext),
            None => Err(RfpError::UnsupportedFormat {
                media_type: format!("(no extension) {}", path.display()),
            }),
        }
    }

    /// Canonical MIME string.
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::Html => "text/html",
            MediaType::PlainText => "text/plain",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// One document submitted for extraction.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Display name (file name), used only in logs.
    pub name: Option<String>,
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

impl UploadedDocument {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: MediaType) -> Self {
        Self {
            name: None,
            bytes: bytes.into(),
            media_type,
        }
    }

    /// Build from bytes and a declared media-type string, as an upload form
    /// would supply them.
    pub fn from_declared(bytes: impl Into<Vec<u8>>, declared: &str) -> Result<Self, RfpError> {
        Ok(Self::new(bytes, MediaType::from_tag(declared)?))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name for log lines.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<upload>")
    }
}

/// Read a document from disk.
///
/// `declared` overrides extension-based detection. The media type is resolved
/// before the file is read so an unsupported type fails without touching disk.
pub async fn load_document(
    path: impl AsRef<Path>,
    declared: Option<&str>,
) -> Result<UploadedDocument, RfpError> {
    let path = path.as_ref();
    let media_type = match declared {
        Some(tag) => MediaType::from_tag(tag)?,
        None => MediaType::from_path(path)?,
    };

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RfpError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => RfpError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => RfpError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    })?;

    debug!(
        path = %path.display(),
        media_type = %media_type,
        bytes = bytes.len(),
        "Loaded document"
    );

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(UploadedDocument::new(bytes, media_type).with_name(name))
}
