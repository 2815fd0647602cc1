use std::panic;

use crate::analysis::AnalysisError;

use super::normalize;

/// Raw text of each page of a PDF, in document order.
///
/// A PDF with no extractable text yields empty pages, not an error.
pub fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<String>, AnalysisError> {
    // pdf-extract panics on some malformed inputs instead of returning Err
    let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|payload| AnalysisError::ExtractionFailed(panic_message(payload)))?
        .map_err(|e| AnalysisError::ExtractionFailed(format!("{:?}", e)))?;

    tracing::debug!("Extracted {} page(s) from {} bytes", pages.len(), bytes.len());

    Ok(pages)
}

/// Normalize each page and concatenate them in document order.
/// Pages without text contribute nothing.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pages
        .into_iter()
        .map(|page| normalize(page.as_ref()))
        .filter(|page| !page.is_empty())
        .collect()
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "PDF parser aborted".to_string()
    }
}
