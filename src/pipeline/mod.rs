//! Pipeline stages for RFP extraction.
//!
//! Each submodule implements exactly one transformation step, so every stage
//! can be tested without the ones after it.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ reader ──▶ normalize ──▶ request ──▶ llm
//! (bytes)   (text)     (bounded)     (prompt)    (JSON map)
//! ```
//!
//! 1. [`input`]    : load the document and resolve its media type
//! 2. [`reader`]   : pull raw text out of the PDF / HTML / UTF-8 container;
//!    PDF parsing runs in `spawn_blocking` because pdfium is not async-safe
//! 3. [`normalize`]: collapse whitespace and cut to the character budget
//! 4. [`request`]  : compose the system + user instructions and call options
//! 5. [`llm`]      : the single chat-completions call; the only stage with
//!    network I/O

pub mod input;
pub mod llm;
pub mod normalize;
pub mod reader;
pub mod request;
