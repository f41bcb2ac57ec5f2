//! Extraction results and their presentation.
//!
//! The model is *asked* for the 20 catalog fields but nothing forces it to
//! comply: it may drop fields, add its own, or return nested objects for
//! things like contact details. [`ExtractionResult`] is therefore an open
//! JSON map rather than a struct, and lookups return [`FieldValue::Absent`]
//! instead of failing.

use crate::error::RfpError;
use crate::pipeline::input::MediaType;
use crate::pipeline::normalize::NormalizedText;
use crate::schema::FieldSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the downloadable results file.
pub const DOWNLOAD_FILE_NAME: &str = "rfp_extraction_results.json";

/// Field name → extracted value, exactly as the model returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionResult(Map<String, Value>);

/// Outcome of looking up one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// A string value.
    Text(&'a str),
    /// The key is present with an explicit `null`.
    Null,
    /// Any other JSON value (number, list, object…).
    Structured(&'a Value),
    /// The model did not return this key.
    Absent,
}

impl<'a> FieldValue<'a> {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    pub fn as_text(&self) -> Option<&'a str> {
        match *self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl ExtractionResult {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Look up a field; never fails.
    pub fn get(&self, field: &str) -> FieldValue<'_> {
        match self.0.get(field) {
            None => FieldValue::Absent,
            Some(Value::Null) => FieldValue::Null,
            Some(Value::String(s)) => FieldValue::Text(s),
            Some(other) => FieldValue::Structured(other),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Catalog fields the model did not return, in catalog order.
    pub fn missing_fields(&self, schema: &FieldSchema) -> Vec<&'static str> {
        schema
            .fields()
            .iter()
            .copied()
            .filter(|f| !self.0.contains_key(*f))
            .collect()
    }

    /// Keys the model returned that are not in the catalog, in reply order.
    pub fn extra_fields(&self, schema: &FieldSchema) -> Vec<&str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|k| !schema.contains(k))
            .collect()
    }
}

/// Per-extraction statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Characters of raw extracted text.
    pub raw_chars: usize,
    /// Characters actually sent to the model.
    pub normalized_chars: usize,
    /// Whether the budget cut removed text.
    pub truncated: bool,
    /// Prompt tokens reported by the service, when it reports usage.
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub read_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything one extraction produced.
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    pub media_type: MediaType,
    /// Text as it came out of the reader, before normalisation.
    pub raw_text: String,
    pub normalized_text: NormalizedText,
    pub result: ExtractionResult,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// See [`to_download_payload`].
    pub fn download_payload(&self) -> Result<String, RfpError> {
        to_download_payload(&self.result)
    }

    /// See [`render`].
    pub fn render(&self, schema: &FieldSchema) -> String {
        render(&self.result, schema)
    }
}

/// UTF-8 JSON with 2-space indentation, as written to the download file.
pub fn to_download_payload(result: &ExtractionResult) -> Result<String, RfpError> {
    serde_json::to_string_pretty(result)
        .map_err(|e| RfpError::Internal(format!("Failed to serialise result: {}", e)))
}

/// Human-readable view: catalog fields in order, then any extra keys.
pub fn render(result: &ExtractionResult, schema: &FieldSchema) -> String {
    let extras = result.extra_fields(schema);
    let width = schema
        .fields()
        .iter()
        .copied()
        .chain(extras.iter().copied())
        .map(|f| f.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::from("Extracted RFP Information\n");
    for field in schema.fields() {
        out.push_str(&render_line(field, result.get(field), width));
    }

    if !extras.is_empty() {
        out.push_str("\nAdditional fields\n");
        for field in extras {
            out.push_str(&render_line(field, result.get(field), width));
        }
    }
    out
}

fn render_line(field: &str, value: FieldValue<'_>, width: usize) -> String {
    let shown = match value {
        FieldValue::Text(s) if s.trim().is_empty() => "(empty)".to_string(),
        FieldValue::Text(s) => s.to_string(),
        FieldValue::Null => "(not provided)".to_string(),
        FieldValue::Structured(v) => v.to_string(),
        FieldValue::Absent => "(not found)".to_string(),
    };
    format!("  {:<width$}  {}\n", format!("{field}:"), shown, width = width + 1)
}

/// Write the download payload to `dir/rfp_extraction_results.json`.
///
/// Writes to a temp file then renames, so an interrupted run never leaves a
/// half-written results file behind.
pub async fn write_download(result: &ExtractionResult, dir: impl AsRef<Path>) -> Result<PathBuf, RfpError> {
    let dir = dir.as_ref();
    let path = dir.join(DOWNLOAD_FILE_NAME);
    let payload = to_download_payload(result)?;

    let write_err = |source| RfpError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_err)?;

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, payload.as_bytes())
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, &path).await.map_err(write_err)?;

    info!(path = %path.display(), fields = result.len(), "Wrote extraction results");
    Ok(path)
}
