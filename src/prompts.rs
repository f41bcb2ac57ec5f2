//! Prompts for LLM-based RFP field extraction.
//!
//! All prompt text lives here so tests can inspect it directly and so a
//! wording change touches one file. Callers can replace the system prompt via
//! [`crate::config::ExtractionConfig::system_prompt`]; the user prompt layout
//! is fixed because the reply parser depends on its JSON-only directive.

use crate::schema::FieldSchema;

/// Default system prompt establishing the assistant's role.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert RFP information extraction assistant.";

/// The four extraction guidelines, in the order they are numbered.
pub const EXTRACTION_GUIDELINES: [&str; 4] = [
    "Be extremely specific and precise",
    "Use actual text from document where possible",
    "Infer contextually if direct match isn't found",
    "Provide most relevant information for each field",
];

/// Closing directive; the reply parser only accepts a bare JSON object.
pub const JSON_ONLY_DIRECTIVE: &str = "Respond ONLY with a valid, complete JSON object.";

/// Build the user-role instruction for one document.
///
/// Layout:
/// 1. required field names, comma separated
/// 2. numbered extraction guidelines
/// 3. the document text, verbatim
/// 4. the JSON-only directive
pub fn user_prompt(schema: &FieldSchema, document_text: &str) -> String {
    let guidelines = EXTRACTION_GUIDELINES
        .iter()
        .enumerate()
        .map(|(i, g)| format!("{}. {}", i + 1, g))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Extract precise, structured information from this RFP document.\n\
Required Fields: {fields}\n\
\n\
Extraction Guidelines:\n\
{guidelines}\n\
\n\
Document Text:\n\
{document_text}\n\
\n\
{JSON_ONLY_DIRECTIVE}",
        fields = schema.joined(),
    )
}
