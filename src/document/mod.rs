//! Uploaded documents and text extraction
//!
//! A [`Document`] is built once per upload and never changes afterwards.
//! Uploading again produces a new document with a new id; nothing computed
//! against the old one carries over.

mod extract;
mod normalize;

use serde::Serialize;
use uuid::Uuid;

use crate::analysis::AnalysisError;

pub use extract::{extract_pdf_pages, join_pages};
pub use normalize::normalize;

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: Uuid,
    #[serde(skip)]
    raw_bytes: Vec<u8>,
    text: String,
}

impl Document {
    /// Extract and normalize the text of a PDF
    pub fn from_pdf(bytes: Vec<u8>) -> Result<Self, AnalysisError> {
        let pages = extract_pdf_pages(&bytes)?;
        Ok(Self::from_pages(bytes, pages))
    }

    /// Build a document from already extracted page texts
    pub fn from_pages<I, S>(bytes: Vec<u8>, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_text(bytes, join_pages(pages))
    }

    fn with_text(raw_bytes: Vec<u8>, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            raw_bytes,
            text,
        }
    }

    /// Normalized full text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
