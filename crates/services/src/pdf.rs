//! PDF text extraction capability (spec §4.2 `extract_text`).
//!
//! Callers are responsible for the file-level constraints (existence, MIME,
//! size, `%PDF-` header) described in spec §4.2/§6 — this module only wraps
//! the extraction library and lets its errors surface verbatim.

use crate::error::ServiceError;

/// Extract plain text from PDF bytes. Wraps `pdf-extract` (used the same way
/// in the `InfinitiBit-graphbit` and `BSteffaniak-crime-map` manifests in the
/// example pack) and surfaces its error message verbatim, as spec §4.2
/// requires ("extraction library error surfaces verbatim").
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ServiceError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ServiceError::PdfExtraction(e.to_string()))
}
