//! Compose the model request for one document.
//!
//! Prompt wording lives in [`crate::prompts`]; this stage only pairs it with
//! the normalised text and the call parameters from the config.

use crate::config::ExtractionConfig;
use crate::pipeline::normalize::NormalizedText;
use crate::prompts::{user_prompt, DEFAULT_SYSTEM_PROMPT};
use crate::schema::FieldSchema;

/// Shape the model is asked to reply in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// A single JSON object (`{"type": "json_object"}`).
    JsonObject,
}

impl ResponseFormat {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            ResponseFormat::JsonObject => "json_object",
        }
    }
}

/// The instruction pair plus call parameters. Built fresh for every call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub response_format: ResponseFormat,
    pub max_tokens: usize,
    pub temperature: f32,
}

/// Build the request for `text` against `schema`.
pub fn build_request(
    text: &NormalizedText,
    schema: &FieldSchema,
    config: &ExtractionConfig,
) -> ExtractionRequest {
    let system = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT)
        .to_string();

    ExtractionRequest {
        model: config.model.clone(),
        system,
        user: user_prompt(schema, text.as_str()),
        response_format: ResponseFormat::JsonObject,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::normalize;

    #[test]
    fn build_request_defaults() {
        let config = ExtractionConfig::default();
        let text = normalize("Bid Number: RFP-9", 4000);
        let req = build_request(&text, FieldSchema::rfp(), &config);

        assert_eq!(req.system, DEFAULT_SYSTEM_PROMPT);
        assert!(req.user.contains("Bid Number: RFP-9"));
        assert_eq!(req.response_format, ResponseFormat::JsonObject);
        assert_eq!(req.max_tokens, 1000);
        assert!((req.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(req.model, crate::config::DEFAULT_MODEL);
    }

    #[test]
    fn system_prompt_override() {
        let config = ExtractionConfig::builder()
            .system_prompt("You extract tenders.")
            .build()
            .unwrap();
        let req = build_request(&normalize("x", 10), FieldSchema::rfp(), &config);
        assert_eq!(req.system, "You extract tenders.");
    }
}
