//! Lexicon-based sentiment scoring
//!
//! Each known adjective carries a polarity in [-1, 1] and a subjectivity in
//! [0, 1]. Intensifiers scale the next scored word, negations flip and damp
//! it. The document score is the mean over all scored words.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// -1.0 (negative) to 1.0 (positive)
    pub polarity: f64,
    /// 0.0 (objective) to 1.0 (subjective)
    pub subjectivity: f64,
}

impl SentimentScore {
    pub fn neutral() -> Self {
        Self {
            polarity: 0.0,
            subjectivity: 0.0,
        }
    }
}

impl Default for SentimentScore {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Computes a polarity/subjectivity pair for a block of text
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> Result<SentimentScore, AnalysisError>;
}

/// Polarity multiplier applied to a negated word
const NEGATION_FACTOR: f64 = -0.5;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z]+(?:'[a-z]+)?|[.!?;]").expect("token regex is valid")
});

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "nothing", "neither", "nor", "hardly", "don't", "doesn't", "didn't",
    "isn't", "aren't", "wasn't", "weren't", "can't", "couldn't", "won't", "wouldn't",
    "shouldn't", "haven't", "hasn't",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("extremely", 1.5),
    ("incredibly", 1.5),
    ("highly", 1.3),
    ("so", 1.2),
    ("quite", 1.1),
    ("most", 1.2),
    ("somewhat", 0.7),
    ("slightly", 0.5),
];

const LEXICON: &[(&str, f64, f64)] = &[
    // positive
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("excellent", 1.0, 1.0),
    ("amazing", 0.6, 0.9),
    ("wonderful", 1.0, 1.0),
    ("awesome", 1.0, 1.0),
    ("superb", 1.0, 1.0),
    ("brilliant", 0.9, 1.0),
    ("perfect", 1.0, 1.0),
    ("fantastic", 0.4, 0.9),
    ("impressive", 1.0, 1.0),
    ("remarkable", 0.75, 0.75),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("nice", 0.6, 1.0),
    ("pleasant", 0.73, 0.97),
    ("beautiful", 0.85, 1.0),
    ("happy", 0.8, 1.0),
    ("glad", 0.5, 1.0),
    ("love", 0.5, 0.6),
    ("successful", 0.75, 0.95),
    ("strong", 0.43, 0.73),
    ("positive", 0.23, 0.54),
    ("favorable", 0.5, 0.75),
    ("profitable", 0.5, 0.5),
    ("easy", 0.43, 0.83),
    ("interesting", 0.5, 0.5),
    ("important", 0.4, 1.0),
    ("significant", 0.38, 0.88),
    ("free", 0.4, 0.8),
    ("new", 0.14, 0.45),
    ("clear", 0.1, 0.38),
    ("high", 0.16, 0.54),
    ("large", 0.21, 0.43),
    // negative
    ("bad", -0.7, 0.67),
    ("poor", -0.4, 0.6),
    ("terrible", -1.0, 1.0),
    ("awful", -1.0, 1.0),
    ("horrible", -1.0, 1.0),
    ("worst", -1.0, 1.0),
    ("worse", -0.4, 0.6),
    ("negative", -0.3, 0.4),
    ("sad", -0.5, 1.0),
    ("angry", -0.5, 1.0),
    ("hate", -0.8, 0.9),
    ("disappointing", -0.6, 0.7),
    ("weak", -0.38, 0.63),
    ("difficult", -0.5, 1.0),
    ("hard", -0.29, 0.54),
    ("wrong", -0.5, 0.9),
    ("ugly", -0.7, 1.0),
    ("boring", -1.0, 1.0),
    ("failed", -0.5, 0.3),
    ("unfortunate", -0.5, 0.9),
    ("painful", -0.7, 0.9),
    ("dangerous", -0.6, 0.9),
    ("stupid", -0.8, 1.0),
    ("useless", -0.5, 0.2),
    ("slow", -0.3, 0.4),
    ("expensive", -0.5, 0.7),
    ("serious", -0.33, 0.67),
    ("small", -0.25, 0.4),
    // objective
    ("simple", 0.0, 0.36),
    ("low", 0.0, 0.3),
];

pub struct LexiconScorer {
    lexicon: HashMap<&'static str, (f64, f64)>,
    intensifiers: HashMap<&'static str, f64>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        Self {
            lexicon: LEXICON.iter().map(|&(w, p, s)| (w, (p, s))).collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> Result<SentimentScore, AnalysisError> {
        let mut assessments: Vec<(f64, f64)> = Vec::new();
        let mut negated = false;
        let mut intensity = 1.0;

        for token in TOKEN.find_iter(text) {
            let word = token.as_str().to_lowercase();

            if matches!(word.as_str(), "." | "!" | "?" | ";") {
                negated = false;
                intensity = 1.0;
                continue;
            }

            if NEGATIONS.contains(&word.as_str()) {
                negated = true;
                continue;
            }

            if let Some(factor) = self.intensifiers.get(word.as_str()) {
                intensity *= factor;
                continue;
            }

            if let Some(&(polarity, subjectivity)) = self.lexicon.get(word.as_str()) {
                let mut polarity = (polarity * intensity).clamp(-1.0, 1.0);
                if negated {
                    polarity *= NEGATION_FACTOR;
                }
                assessments.push((polarity, (subjectivity * intensity).min(1.0)));
                negated = false;
                intensity = 1.0;
            }
        }

        if assessments.is_empty() {
            return Ok(SentimentScore::neutral());
        }

        let n = assessments.len() as f64;
        let polarity = assessments.iter().map(|a| a.0).sum::<f64>() / n;
        let subjectivity = assessments.iter().map(|a| a.1).sum::<f64>() / n;

        if !polarity.is_finite() || !subjectivity.is_finite() {
            return Err(AnalysisError::ScoringFailed(
                "score is not a finite number".into(),
            ));
        }

        Ok(SentimentScore {
            polarity: polarity.clamp(-1.0, 1.0),
            subjectivity: subjectivity.clamp(0.0, 1.0),
        })
    }
}
