//! Top-level extraction entry points.
//!
//! One document in, one [`ExtractionOutput`] out. The stages run strictly in
//! sequence and any failure aborts the whole extraction: callers either get a
//! complete result or a single [`RfpError`], never a partial map.
//!
//! The pipeline is split in two phases, [`read_document`] (local, no network)
//! and [`extract_text`] (the model call), so a front end can show the raw text
//! before waiting on the model. [`extract_document`] runs both.

use crate::config::ExtractionConfig;
use crate::error::RfpError;
use crate::output::{ExtractionOutput, ExtractionStats};
use crate::pipeline::input::{self, MediaType, UploadedDocument};
use crate::pipeline::llm::ExtractionClient;
use crate::pipeline::normalize::{self, NormalizedText};
use crate::pipeline::{reader, request};
use crate::schema::FieldSchema;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Text pulled out of a document, ready for the model call.
#[derive(Debug, Clone)]
pub struct DocumentText {
    pub media_type: MediaType,
    pub raw_text: String,
    pub normalized: NormalizedText,
    pub read_duration_ms: u64,
}

/// Phase 1: read and normalise a document. No network I/O.
pub async fn read_document(
    doc: &UploadedDocument,
    config: &ExtractionConfig,
) -> Result<DocumentText, RfpError> {
    info!("Reading document: {} ({})", doc.label(), doc.media_type);

    let read_start = Instant::now();
    let raw_text = reader::read_text(doc, config).await?;
    let normalized = normalize::normalize(&raw_text, config.text_budget);
    let read_duration_ms = read_start.elapsed().as_millis() as u64;

    if normalized.was_truncated() {
        warn!(
            "Document text truncated from {} to {} characters",
            normalized.original_chars(),
            normalized.char_count()
        );
    }
    if normalized.as_str().is_empty() {
        warn!("Document has no extractable text; the model will see an empty body");
    }

    Ok(DocumentText {
        media_type: doc.media_type,
        raw_text,
        normalized,
        read_duration_ms,
    })
}

/// Phase 2: send normalised text to the model and collect the result.
///
/// # Errors
/// [`RfpError::Authentication`] when `config.api_key` is missing (before any
/// request), otherwise the classification in [`crate::pipeline::llm`].
pub async fn extract_text(
    text: DocumentText,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, RfpError> {
    let schema = FieldSchema::rfp();
    let req = request::build_request(&text.normalized, schema, config);
    debug!(
        system_chars = req.system.len(),
        user_chars = req.user.len(),
        "Composed extraction request"
    );

    let client = ExtractionClient::new(config)?;
    let llm_start = Instant::now();
    let reply = client.extract(&req, config.api_key.as_ref()).await?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    let missing = reply.result.missing_fields(schema);
    if !missing.is_empty() {
        debug!("Model omitted {} catalog fields: {:?}", missing.len(), missing);
    }

    let stats = ExtractionStats {
        raw_chars: text.raw_text.chars().count(),
        normalized_chars: text.normalized.char_count(),
        truncated: text.normalized.was_truncated(),
        prompt_tokens: reply.usage.and_then(|u| u.prompt_tokens),
        completion_tokens: reply.usage.and_then(|u| u.completion_tokens),
        read_duration_ms: text.read_duration_ms,
        llm_duration_ms,
        total_duration_ms: text.read_duration_ms + llm_duration_ms,
    };

    info!(
        "Extraction complete: {}/{} catalog fields returned, {}ms total",
        schema.len() - missing.len(),
        schema.len(),
        stats.total_duration_ms
    );

    Ok(ExtractionOutput {
        media_type: text.media_type,
        raw_text: text.raw_text,
        normalized_text: text.normalized,
        result: reply.result,
        stats,
    })
}

/// Extract RFP fields from an in-memory document.
///
/// This is the primary entry point for the library.
pub async fn extract_document(
    doc: &UploadedDocument,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, RfpError> {
    let text = read_document(doc, config).await?;
    extract_text(text, config).await
}

/// Extract RFP fields from a file on disk.
///
/// `media_type` overrides detection from the file extension.
pub async fn extract_file(
    path: impl AsRef<Path>,
    media_type: Option<&str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, RfpError> {
    let doc = input::load_document(path, media_type).await?;
    extract_document(&doc, config).await
}

/// Synchronous wrapper around [`extract_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    doc: &UploadedDocument,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, RfpError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| RfpError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_document(doc, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_document_normalises_to_budget() {
        let config = ExtractionConfig::builder().text_budget(10).build().unwrap();
        let doc = UploadedDocument::new(b"Bid\n\nNumber:   RFP-2024-001".to_vec(), MediaType::PlainText);

        let text = read_document(&doc, &config).await.unwrap();
        assert_eq!(text.raw_text, "Bid\n\nNumber:   RFP-2024-001");
        assert_eq!(text.normalized.as_str(), "Bid Number");
        assert!(text.normalized.was_truncated());
    }

    #[tokio::test]
    async fn decoding_error_propagates() {
        let doc = UploadedDocument::new(vec![0xff, 0xfe, 0x00], MediaType::PlainText);
        let err = extract_document(&doc, &ExtractionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RfpError::Decoding { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn no_key_is_authentication_error() {
        let doc = UploadedDocument::new(b"Bid Number: 1".to_vec(), MediaType::PlainText);
        let err = extract_document(&doc, &ExtractionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RfpError::Authentication { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn extract_file_rejects_unsupported_extension() {
        let err = extract_file("scan.png", None, &ExtractionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RfpError::UnsupportedFormat { .. }), "got {err:?}");
    }

    #[test]
    fn sync_wrapper_reports_errors() {
        let doc = UploadedDocument::new(b"Bid".to_vec(), MediaType::PlainText);
        let err = extract_sync(&doc, &ExtractionConfig::default()).unwrap_err();
        assert!(matches!(err, RfpError::Authentication { .. }));
    }
}
