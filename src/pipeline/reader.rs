//! Text extraction from the three supported document containers.
//!
//! ## Why pdfium for PDFs?
//!
//! pdfium is the engine Chrome uses; its text layer handles the odd encodings
//! and font maps that procurement portals produce far better than pure-Rust
//! parsers. The cost is a shared library that must be bound at runtime, so a
//! missing library surfaces as [`RfpError::PdfiumBindingFailed`] rather than a
//! crash.
//!
//! PDF work runs inside `spawn_blocking`: pdfium keeps thread-local state and
//! parsing a long RFP is CPU-bound.

use crate::config::ExtractionConfig;
use crate::error::RfpError;
use crate::pipeline::input::{MediaType, UploadedDocument};
use pdfium_render::prelude::*;
use scraper::Html;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Elements whose text content is never visible.
const INVISIBLE_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Extract raw text from a document, dispatching on its media type.
///
/// Never returns an absent value: an empty document yields `""`.
pub async fn read_text(doc: &UploadedDocument, config: &ExtractionConfig) -> Result<String, RfpError> {
    let text = match doc.media_type {
        MediaType::Pdf => {
            let bytes = doc.bytes.clone();
            let lib_path = config.pdfium_lib_path.clone();
            tokio::task::spawn_blocking(move || read_pdf(&bytes, lib_path.as_deref()))
                .await
                .map_err(|e| RfpError::Internal(format!("PDF task panicked: {}", e)))??
        }
        MediaType::Html => read_html(&doc.bytes),
        MediaType::PlainText => read_plain(&doc.bytes)?,
    };

    info!(
        document = doc.label(),
        media_type = %doc.media_type,
        chars = text.chars().count(),
        "Extracted document text"
    );
    Ok(text)
}

/// Concatenate the text layer of every page in document order.
///
/// Pages without a text layer (scans, blank pages) contribute nothing.
pub fn read_pdf(bytes: &[u8], lib_path: Option<&Path>) -> Result<String, RfpError> {
    let pdfium = bind_pdfium(lib_path)?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| RfpError::CorruptPdf {
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    debug!("PDF loaded: {} pages", pages.len());

    let page_texts = pages.iter().enumerate().map(|(idx, page)| match page.text() {
        Ok(text) => Some(text.all()),
        Err(e) => {
            warn!("Page {}: no extractable text ({:?})", idx + 1, e);
            None
        }
    });

    Ok(join_page_texts(page_texts))
}

/// Join per-page text in the order given, one newline between pages.
///
/// `None` marks a page without a text layer and contributes an empty string,
/// so page boundaries stay in place. Zero pages yield `""`.
pub fn join_page_texts(pages: impl IntoIterator<Item = Option<String>>) -> String {
    pages
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bind pdfium from an explicit directory, or next to the executable and then
/// from the system loader.
fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, RfpError> {
    let bindings = match lib_path {
        Some(dir) => Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path(&PathBuf::from("./")))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| RfpError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Visible text of an HTML document, text nodes joined by single spaces.
///
/// Each text node is trimmed and empty nodes are dropped, so the result has no
/// leading or trailing whitespace. Bytes that are not valid UTF-8 are replaced
/// rather than rejected; real-world pages often mislabel their charset.
pub fn read_html(bytes: &[u8]) -> String {
    let source = String::from_utf8_lossy(bytes);
    let document = Html::parse_document(&source);

    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|el| INVISIBLE_ELEMENTS.contains(&el.name()))
            });
            if hidden {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode plain text as strict UTF-8.
pub fn read_plain(bytes: &[u8]) -> Result<String, RfpError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| RfpError::Decoding {
            detail: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_visible_text_joined_with_spaces() {
        let html = b"<html><head><title>City RFP</title><style>p{color:red}</style></head>\
<body><h1>Bid Number</h1><p>  RFP-2024-001 </p><script>var x = 1;</script>\
<div>Due <b>March 1</b>, 2024</div></body></html>";
        assert_eq!(
            read_html(html),
            "City RFP Bid Number RFP-2024-001 Due March 1 , 2024"
        );
    }

    #[test]
    fn html_skips_noscript_and_comments() {
        let html = b"<body><noscript>enable js</noscript><!-- hidden --><p>Shown</p></body>";
        assert_eq!(read_html(html), "Shown");
    }

    #[test]
    fn html_empty_document_is_empty_string() {
        assert_eq!(read_html(b""), "");
        assert_eq!(read_html(b"<html><body>   </body></html>"), "");
    }

    #[test]
    fn plain_text_decodes_utf8() {
        let text = read_plain("Délai: 1 mars".as_bytes()).unwrap();
        assert_eq!(text, "Délai: 1 mars");
    }

    #[test]
    fn plain_text_rejects_invalid_utf8() {
        let err = read_plain(&[0x66, 0x6f, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, RfpError::Decoding { .. }), "got {err:?}");
    }

    #[test]
    fn garbage_pdf_is_an_error_not_a_panic() {
        // Without a pdfium library this is a binding error; with one, the
        // bytes are rejected as corrupt. Either way it is a typed error.
        let err = read_pdf(b"not a pdf at all", None).unwrap_err();
        assert!(
            matches!(
                err,
                RfpError::CorruptPdf { .. } | RfpError::PdfiumBindingFailed(_)
            ),
            "got {err:?}"
        );
    }

    #[test]
    fn pages_join_in_document_order() {
        let pages = vec![
            Some("Bid Number: RFP-1".to_string()),
            Some("Due Date: May 2".to_string()),
            Some("Payment Terms: Net 30".to_string()),
        ];
        assert_eq!(
            join_page_texts(pages),
            "Bid Number: RFP-1\nDue Date: May 2\nPayment Terms: Net 30"
        );
    }

    #[test]
    fn textless_page_contributes_empty_string() {
        let pages = vec![Some("Title: Fleet".to_string()), None, Some("Terms".to_string())];
        assert_eq!(join_page_texts(pages), "Title: Fleet\n\nTerms");
        assert_eq!(join_page_texts(vec![None]), "");
    }

    #[test]
    fn zero_pages_is_empty_text() {
        assert_eq!(join_page_texts(Vec::<Option<String>>::new()), "");
    }

    #[tokio::test]
    async fn read_text_dispatches_on_media_type() {
        let config = ExtractionConfig::default();

        let doc = UploadedDocument::new(b"<p>Hello</p>".to_vec(), MediaType::Html);
        assert_eq!(read_text(&doc, &config).await.unwrap(), "Hello");

        let doc = UploadedDocument::new(b"  Hello\n".to_vec(), MediaType::PlainText);
        assert_eq!(read_text(&doc, &config).await.unwrap(), "  Hello\n");
    }
}
