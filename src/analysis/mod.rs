//! Document analysis pipeline
//!
//! Every stage reads the normalized text of the current [`Document`] and
//! returns a value or an [`AnalysisError`]. A failing stage degrades to
//! "no result" on its own; it never aborts the others.

pub mod entities;
pub mod export;
pub mod search;
pub mod sentiment;

use serde::Serialize;
use uuid::Uuid;

use crate::document::Document;

pub use entities::{Entity, EntityTagger, PatternTagger};
pub use export::{ExportError, ExportPayload};
pub use search::{search, SearchHit};
pub use sentiment::{LexiconScorer, SentimentScore, SentimentScorer};

#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    #[error("An error occurred while extracting text from the PDF: {0}")]
    ExtractionFailed(String),

    #[error("An error occurred while extracting entities: {0}")]
    TaggingFailed(String),

    #[error("An error occurred while analyzing sentiment: {0}")]
    ScoringFailed(String),
}

impl AnalysisError {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::ExtractionFailed(_) => "extraction_failed",
            AnalysisError::TaggingFailed(_) => "tagging_failed",
            AnalysisError::ScoringFailed(_) => "scoring_failed",
        }
    }
}

/// Result of one analysis stage, tagged with the document it was computed from
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult<T> {
    pub document_id: Uuid,
    pub value: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the analysis stages against a document
pub struct DocumentAnalyzer {
    tagger: Box<dyn EntityTagger>,
    scorer: Box<dyn SentimentScorer>,
}

impl DocumentAnalyzer {
    pub fn new(tagger: Box<dyn EntityTagger>, scorer: Box<dyn SentimentScorer>) -> Self {
        Self { tagger, scorer }
    }

    /// Named entities; a tagging failure yields an empty list and the error
    pub fn entities(&self, doc: &Document) -> AnalysisResult<Vec<Entity>> {
        match self.tagger.tag(doc.text()) {
            Ok(entities) => {
                tracing::debug!("Tagged {} entities in document {}", entities.len(), doc.id);
                AnalysisResult {
                    document_id: doc.id,
                    value: entities,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("Entity tagging failed for document {}: {}", doc.id, e);
                AnalysisResult {
                    document_id: doc.id,
                    value: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Sentiment; a scoring failure yields the neutral score and the error
    pub fn sentiment(&self, doc: &Document) -> AnalysisResult<SentimentScore> {
        match self.scorer.score(doc.text()) {
            Ok(score) => AnalysisResult {
                document_id: doc.id,
                value: score,
                error: None,
            },
            Err(e) => {
                tracing::warn!("Sentiment scoring failed for document {}: {}", doc.id, e);
                AnalysisResult {
                    document_id: doc.id,
                    value: SentimentScore::neutral(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn search(&self, doc: &Document, query: &str) -> AnalysisResult<Vec<SearchHit>> {
        AnalysisResult {
            document_id: doc.id,
            value: search(doc.text(), query),
            error: None,
        }
    }
}

impl Default for DocumentAnalyzer {
    fn default() -> Self {
        Self::new(
            Box::new(PatternTagger::default()),
            Box::new(LexiconScorer::default()),
        )
    }
}
