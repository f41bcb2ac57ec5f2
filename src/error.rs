//! Error type for the rfp-extract library.
//!
//! Every stage of the pipeline returns `Result<_, RfpError>`. There is no
//! partial-success path: an extraction either yields a complete
//! [`crate::output::ExtractionResult`] or exactly one of these variants, and
//! the caller renders that as a single message.
//!
//! The first six variants map one-to-one onto the failure kinds a user can
//! act on (wrong file type, bad encoding, bad key, network, service error,
//! unusable reply). The rest cover local I/O and setup problems.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the rfp-extract library.
#[derive(Debug, Error)]
pub enum RfpError {
    // ── Document errors ───────────────────────────────────────────────────
    /// The declared media type is not PDF, HTML, or plain text.
    #[error("Unsupported file type '{media_type}'\nSupported types: PDF, HTML, plain text.")]
    UnsupportedFormat { media_type: String },

    /// Plain-text bytes are not valid UTF-8.
    #[error("Document is not valid UTF-8 text: {detail}")]
    Decoding { detail: String },

    /// pdfium could not open or parse the PDF.
    #[error("PDF is corrupt or unreadable: {detail}")]
    CorruptPdf { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF text extraction needs the pdfium shared library.\n\
  • Set PDFIUM_LIB_PATH=/path/to/dir-containing-libpdfium, or\n\
  • install libpdfium where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Model service errors ──────────────────────────────────────────────
    /// No credential was supplied, or the service rejected it (401/403).
    #[error("Authentication failed: {detail}\nProvide a valid key with --api-key or OPENAI_API_KEY.")]
    Authentication { detail: String },

    /// The request could not be delivered or the reply could not be read.
    #[error("Could not reach the model service: {detail}")]
    Transport { detail: String },

    /// The service answered with a non-success status.
    #[error("Model service returned HTTP {status}: {detail}")]
    Upstream { status: u16, detail: String },

    /// The reply was not a single JSON object.
    #[error("Model reply is not a valid JSON object: {detail}")]
    MalformedResponse { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Could not create or write the results file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
