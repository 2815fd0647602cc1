//! Named-entity tagging
//!
//! [`EntityTagger`] is the seam for any NER model. The built-in
//! [`PatternTagger`] combines ordered pattern rules and gazetteers with a
//! capitalised-run heuristic for person names. Rules are applied in priority
//! order; each accepted span claims its characters so lower-priority rules
//! cannot tag inside it. Results come back left to right.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::AnalysisError;

/// Texts longer than this (in characters) are rejected by default
pub const DEFAULT_MAX_LENGTH: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Person,
    Org,
    Gpe,
    Loc,
    Date,
    Time,
    Money,
    Percent,
    Cardinal,
    Product,
    Language,
    WorkOfArt,
}

impl EntityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityLabel::Person => "PERSON",
            EntityLabel::Org => "ORG",
            EntityLabel::Gpe => "GPE",
            EntityLabel::Loc => "LOC",
            EntityLabel::Date => "DATE",
            EntityLabel::Time => "TIME",
            EntityLabel::Money => "MONEY",
            EntityLabel::Percent => "PERCENT",
            EntityLabel::Cardinal => "CARDINAL",
            EntityLabel::Product => "PRODUCT",
            EntityLabel::Language => "LANGUAGE",
            EntityLabel::WorkOfArt => "WORK_OF_ART",
        }
    }

    /// Display colour for tables and exports
    pub fn color(&self) -> &'static str {
        match self {
            EntityLabel::Person => "orange",
            EntityLabel::Cardinal => "lightblue",
            EntityLabel::Org => "blue",
            EntityLabel::Gpe => "darkgreen",
            EntityLabel::Date => "pink",
            EntityLabel::Time => "brown",
            EntityLabel::Money => "green",
            EntityLabel::Loc => "cyan",
            EntityLabel::Product => "yellow",
            EntityLabel::Language => "purple",
            EntityLabel::WorkOfArt => "gold",
            EntityLabel::Percent => "black",
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityLabel {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| AnalysisError::TaggingFailed(format!("unknown entity label {}", s)))
    }
}

/// A labelled span of the analysed text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    /// Byte range in the analysed text
    pub start: usize,
    pub end: usize,
}

/// Produces labelled spans in the order they occur in the text
pub trait EntityTagger: Send + Sync {
    fn tag(&self, text: &str) -> Result<Vec<Entity>, AnalysisError>;
}

struct Rule {
    label: EntityLabel,
    pattern: Regex,
    /// Capture group holding the entity; 0 is the whole match
    group: usize,
    reject: fn(&str) -> bool,
}

impl Rule {
    fn new(label: EntityLabel, pattern: &str) -> Self {
        Self {
            label,
            pattern: Regex::new(pattern).expect("entity rule regex is valid"),
            group: 0,
            reject: |_| false,
        }
    }

    fn group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    fn reject(mut self, reject: fn(&str) -> bool) -> Self {
        self.reject = reject;
        self
    }
}

const MONTH: &str = r"(?:January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec)\.?";

const ORG_SUFFIX: &str = r"(?:Inc|Corp|Corporation|Ltd|LLC|LLP|PLC|plc|Co|Company|Group|Holdings|Partners|Bank|University|Institute|College|Foundation|Association|Agency|Committee|Council|Ministry|Department|Authority|Commission|Laboratories|Labs|Technologies|Systems)";

const GPE_NAMES: &str = r"Afghanistan|Argentina|Australia|Austria|Bangladesh|Belgium|Brazil|Canada|Chile|China|Colombia|Cuba|Denmark|Egypt|England|Ethiopia|Finland|France|Germany|Ghana|Greece|Hungary|India|Indonesia|Iran|Iraq|Ireland|Israel|Italy|Japan|Kenya|Mexico|Morocco|Nepal|Netherlands|New Zealand|Nigeria|Norway|Pakistan|Peru|Philippines|Poland|Portugal|Russia|Saudi Arabia|Scotland|Singapore|South Africa|South Korea|Spain|Sri Lanka|Sweden|Switzerland|Taiwan|Thailand|Turkey|Ukraine|United Kingdom|United States(?: of America)?|Vietnam|Wales|Alabama|Arizona|California|Colorado|Florida|Georgia|Illinois|Massachusetts|Michigan|Minnesota|Nevada|New Jersey|New York|North Carolina|Ohio|Oregon|Pennsylvania|Texas|Virginia|Washington|Amsterdam|Athens|Atlanta|Bangkok|Barcelona|Beijing|Berlin|Boston|Brussels|Cairo|Chicago|Delhi|Dubai|Dublin|Hong Kong|Istanbul|Jakarta|Lagos|Lisbon|London|Los Angeles|Madrid|Manila|Melbourne|Miami|Moscow|Mumbai|Nairobi|Paris|Rome|San Francisco|Seattle|Seoul|Shanghai|Stockholm|Sydney|Tokyo|Toronto|Vancouver|Vienna|Warsaw|Zurich";

const LOC_NAMES: &str = r"Africa|Antarctica|Asia|Europe|North America|South America|Central America|Latin America|Oceania|Middle East|Southeast Asia|Scandinavia|Caribbean|Mediterranean|Sahara|Himalayas|Alps|Arctic";

const LANGUAGES: &str = r"English|French|Spanish|German|Italian|Portuguese|Mandarin|Cantonese|Chinese|Japanese|Korean|Arabic|Hindi|Russian|Latin|Greek|Dutch|Swedish|Polish|Turkish|Hebrew|Swahili|Bengali|Urdu";

const PRODUCTS: &str = r"iPhone|iPad|MacBook|Android|Windows|Excel|PowerPoint|Outlook|Kindle|PlayStation|Xbox|Photoshop|ChatGPT|Boeing 7\d7|Model [3SXY]";

const ACRONYM_STOPLIST: &[&str] = &[
    "CEO", "CFO", "CTO", "COO", "PDF", "OK", "AM", "PM", "TV", "ID", "FAQ", "USD", "EUR", "GBP",
    "US", "USA", "UK", "UAE", "II", "III", "IV", "VI", "VII", "VIII", "IX", "XI", "XII", "AI",
    "IT", "HR", "PS", "NB", "VS", "ETC", "TBD", "N/A",
];

/// Capitalised words that start sentences or titles far more often than names
const NAME_STOPWORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "A", "An", "And", "But", "Or", "If", "In", "On", "At",
    "For", "From", "With", "By", "To", "Of", "As", "Our", "Their", "His", "Her", "Its", "My",
    "Your", "We", "They", "It", "He", "She", "I", "You", "When", "While", "After", "Before",
    "During", "Since", "Although", "However", "Then", "There", "Here", "What", "Which", "Who",
    "Why", "How", "All", "Some", "Each", "Every", "No", "Not", "Dear", "Hello", "Thanks",
    "Regards", "Chapter", "Section", "Table", "Figure", "Page", "Appendix", "Annual", "Quarterly",
    "Report", "Summary", "Introduction", "Conclusion", "Overview", "Board", "Directors",
    "Executive", "Chief", "Officer", "Financial", "Statement", "Total", "Net", "Revenue",
    "Results", "Note", "Notes", "Please", "Yes", "North", "South", "East", "West",
];

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    use EntityLabel::*;

    vec![
        // MONEY
        Rule::new(
            Money,
            r"[$€£¥]\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:million|billion|trillion|thousand|bn|[mk])\b)?",
        ),
        Rule::new(
            Money,
            r"\b\d[\d,]*(?:\.\d+)?\s?(?:(?:million|billion|thousand)\s)?(?:dollars|euros|pounds|yen|cents|USD|EUR|GBP)\b",
        ),
        // PERCENT
        Rule::new(
            Percent,
            r"\b\d+(?:\.\d+)?(?:\s?%|\s?percent\b|\sper cent\b)",
        ),
        // TIME
        Rule::new(
            Time,
            r"(?i)\b\d{1,2}:\d{2}(?::\d{2})?(?:\s?(?:[ap]\.m\.|[ap]m\b))?",
        ),
        Rule::new(Time, r"(?i)\b\d{1,2}\s?(?:[ap]\.m\.|[ap]m\b)"),
        Rule::new(Time, r"(?i)\b(?:noon|midnight)\b"),
        // DATE
        Rule::new(
            Date,
            &format!(r"\b{MONTH}\s+\d{{1,2}}(?:st|nd|rd|th)?(?:,?\s+\d{{4}})?\b"),
        ),
        Rule::new(
            Date,
            &format!(r"\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:of\s+)?{MONTH}(?:,?\s+\d{{4}})?\b"),
        ),
        Rule::new(Date, &format!(r"\b{MONTH},?\s+\d{{4}}\b")),
        Rule::new(Date, r"\b\d{4}-\d{2}-\d{2}\b"),
        Rule::new(Date, r"\b\d{1,2}/\d{1,2}/\d{2,4}\b"),
        Rule::new(
            Date,
            r"\b(?:Q[1-4]|(?:first|second|third|fourth) quarter)(?:\s+(?:of\s+)?\d{4})?\b",
        ),
        Rule::new(
            Date,
            r"(?i)\b(?:(?:last|next|this)\s+(?:week|month|year|quarter)|yesterday|today|tomorrow)\b",
        ),
        Rule::new(
            Date,
            r"\b(?:Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday)\b",
        ),
        Rule::new(Date, r"\b(?:1[5-9]|20)\d{2}s?\b"),
        // ORG
        Rule::new(
            Org,
            &format!(r"\b(?:[A-Z][\w&'.-]*\s+){{0,4}}[A-Z][\w&'.-]*,?\s+{ORG_SUFFIX}\b\.?"),
        ),
        Rule::new(
            Org,
            r"\b(?:University|Bank|Institute|Department|Ministry|Museum|Bureau|Court)\s+of\s+(?:the\s+)?[A-Z]\w+(?:\s+[A-Z]\w+){0,3}",
        ),
        Rule::new(Org, r"\b[A-Z]{2,6}\b").reject(|s| ACRONYM_STOPLIST.contains(&s)),
        // GPE
        Rule::new(Gpe, r"\bU\.S\.(?:A\.)?|\bU\.K\."),
        Rule::new(Gpe, &format!(r"\b(?:{GPE_NAMES}|USA|US|UK|UAE)\b")),
        // LOC
        Rule::new(Loc, &format!(r"\b(?:{LOC_NAMES})\b")),
        Rule::new(Loc, r"\b(?:Mount|Mt\.|Lake)\s+[A-Z]\w+"),
        Rule::new(
            Loc,
            r"\b[A-Z]\w+\s+(?:River|Mountains|Ocean|Sea|Valley|Desert|Island|Islands)\b",
        ),
        // LANGUAGE
        Rule::new(
            Language,
            &format!(r"\b(?:in|into|speaks?|spoke|spoken|fluent in|translated to)\s+({LANGUAGES})\b"),
        )
        .group(1),
        // PRODUCT
        Rule::new(Product, &format!(r"\b(?:{PRODUCTS})\b")),
        // WORK_OF_ART
        Rule::new(WorkOfArt, r#"["“]([A-Z][^"”]{2,80})["”]"#).group(1),
        // CARDINAL
        Rule::new(Cardinal, r"\b\d{1,3}(?:,\d{3})+(?:\.\d+)?\b|\b\d+(?:\.\d+)?\b"),
        Rule::new(
            Cardinal,
            r"(?i)\b(?:one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|dozens?|hundreds?|thousands?|millions?|billions?)\b",
        ),
    ]
});

static CAPITALISED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:[-'][A-Z]?[a-z]+)?\b|\b[A-Z]\.").expect("capitalised regex is valid")
});

/// Rule- and gazetteer-based tagger
pub struct PatternTagger {
    max_length: usize,
}

impl PatternTagger {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Default for PatternTagger {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH)
    }
}

impl EntityTagger for PatternTagger {
    fn tag(&self, text: &str) -> Result<Vec<Entity>, AnalysisError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let length = text.chars().count();
        if length > self.max_length {
            return Err(AnalysisError::TaggingFailed(format!(
                "text of length {} exceeds maximum of {}",
                length, self.max_length
            )));
        }

        let mut claimed = Claims::default();

        for rule in RULES.iter() {
            // person names sit between the gazetteers and bare numbers
            if rule.label == EntityLabel::Cardinal && !claimed.persons_done {
                tag_person_runs(text, &mut claimed);
            }

            for caps in rule.pattern.captures_iter(text) {
                let Some(m) = caps.get(rule.group) else {
                    continue;
                };
                let (start, end) = trim_article(text, m.start(), m.end());
                if start >= end || (rule.reject)(&text[start..end]) {
                    continue;
                }
                claimed.try_claim(start, end, rule.label);
            }
        }

        let entities = claimed
            .spans
            .into_iter()
            .map(|(start, (end, label))| Entity {
                text: text[start..end].to_string(),
                label,
                start,
                end,
            })
            .collect();

        Ok(entities)
    }
}

/// Accepted spans keyed by start offset. Spans never overlap, so only the
/// nearest span starting before `end` can intersect a candidate.
#[derive(Default)]
struct Claims {
    spans: BTreeMap<usize, (usize, EntityLabel)>,
    persons_done: bool,
}

impl Claims {
    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.spans
            .range(..end)
            .next_back()
            .map_or(false, |(_, &(e, _))| e > start)
    }

    fn try_claim(&mut self, start: usize, end: usize, label: EntityLabel) -> bool {
        if self.overlaps(start, end) {
            return false;
        }
        self.spans.insert(start, (end, label));
        true
    }
}

/// Tag runs of two to four capitalised words as people.
///
/// A run is split at already claimed words and at stopwords, so
/// "Yesterday Jane Doe" still yields "Jane Doe".
fn tag_person_runs(text: &str, claimed: &mut Claims) {
    claimed.persons_done = true;

    let mut segment: Vec<(usize, usize, bool)> = Vec::new();
    let flush = |segment: &mut Vec<(usize, usize, bool)>, claimed: &mut Claims| {
        while segment.last().map_or(false, |t| t.2) {
            segment.pop();
        }
        let words = segment.iter().filter(|t| !t.2).count();
        if (2..=4).contains(&words) {
            claimed.try_claim(segment[0].0, segment[segment.len() - 1].1, EntityLabel::Person);
        }
        segment.clear();
    };

    let mut prev_end: Option<usize> = None;
    for m in CAPITALISED.find_iter(text) {
        let word = m.as_str();
        let is_initial = word.len() == 2 && word.ends_with('.');
        let adjacent = prev_end.map_or(false, |p| &text[p..m.start()] == " ");

        if !adjacent {
            flush(&mut segment, claimed);
        }
        prev_end = Some(m.end());

        if NAME_STOPWORDS.contains(&word) || claimed.overlaps(m.start(), m.end()) {
            flush(&mut segment, claimed);
            continue;
        }

        segment.push((m.start(), m.end(), is_initial));
    }
    flush(&mut segment, claimed);
}

fn trim_article(text: &str, start: usize, end: usize) -> (usize, usize) {
    let span = &text[start..end];
    for article in ["The ", "the "] {
        if span.starts_with(article) && span.len() > article.len() {
            return (start + article.len(), end);
        }
    }
    (start, end)
}
