//! # rfp-extract
//!
//! Extract structured bid information from RFP (Request for Proposal)
//! documents using a single call to a hosted language model.
//!
//! RFPs arrive as PDFs, web pages, or plain text with no common layout. The
//! facts a bid team needs (bid number, due date, bond requirements, contact
//! details…) are scattered through prose. This crate pulls the text out of the
//! container, bounds it, and asks an OpenAI-compatible chat model to map it
//! onto a fixed 20-field schema, returning the answer as JSON.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document (pdf / html / txt)
//!  │
//!  ├─ 1. Input      load bytes, resolve media type
//!  ├─ 2. Read       pdfium / scraper / utf-8 decode → raw text
//!  ├─ 3. Normalise  collapse whitespace, cut to the character budget
//!  ├─ 4. Prompt     system + user instruction embedding the field schema
//!  ├─ 5. LLM        one chat-completions call, JSON-object response
//!  └─ 6. Output     rendered view + rfp_extraction_results.json
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rfp_extract::{extract_file, Credential, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .api_key(Credential::new(std::env::var("OPENAI_API_KEY")?))
//!         .build()?;
//!     let output = extract_file("rfp.pdf", None, &config).await?;
//!     println!("{}", output.download_payload()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `rfp-extract` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Credential, ExtractionConfig, ExtractionConfigBuilder};
pub use error::RfpError;
pub use extract::{extract_document, extract_file, extract_sync, extract_text, read_document, DocumentText};
pub use output::{ExtractionOutput, ExtractionResult, ExtractionStats, FieldValue, DOWNLOAD_FILE_NAME};
pub use pipeline::input::{MediaType, UploadedDocument};
pub use pipeline::normalize::NormalizedText;
pub use pipeline::request::ExtractionRequest;
pub use schema::FieldSchema;
