use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Collapse every whitespace run to one space and trim both ends
pub fn normalize(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_double_whitespace(s: &str) -> bool {
        let chars: Vec<char> = s.chars().collect();
        chars
            .windows(2)
            .any(|w| w[0].is_whitespace() && w[1].is_whitespace())
    }

    #[test]
    fn test_collapses_runs() {
        assert_eq!(normalize("a  b\t\tc\n\n\nd"), "a b c d");
        assert_eq!(normalize("\r\n lead and trail \u{a0}\n"), "lead and trail");
    }

    #[test]
    fn test_whitespace_only_becomes_empty() {
        assert_eq!(normalize(" \n\t "), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_output_has_no_double_whitespace() {
        let samples = [
            "Quarterly  report\n\nfor   ACME\tCorp.",
            "\u{2003}\u{2003}em spaces\u{2003}\u{2003}",
            "line\r\nbreaks\r\n\r\neverywhere\n",
            "single",
        ];

        for sample in samples {
            let out = normalize(sample);
            assert!(!has_double_whitespace(&out), "{:?}", out);
            assert_eq!(out, out.trim());
        }
    }
}
