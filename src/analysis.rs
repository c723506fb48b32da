//! Provider-independent scoring of generated text.
//!
//! Scoring starts at [`BASE_SCORE`]. Each keyword adjusts it by density
//! (below 0.5% costs 5, above 3% costs 3, otherwise earns 5), then length
//! adjusts it (under 300 words costs 10, over 3000 costs 5). The result is
//! clamped to 0..=100. Readability is reported and may add a suggestion but
//! never moves the score.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const BASE_SCORE: i32 = 70;
pub const MIN_KEYWORD_DENSITY: f64 = 0.5;
pub const MAX_KEYWORD_DENSITY: f64 = 3.0;
pub const MIN_WORD_COUNT: usize = 300;
pub const MAX_WORD_COUNT: usize = 3000;
pub const READABILITY_WARNING_THRESHOLD: f64 = 60.0;

pub const SHORT_CONTENT_SUGGESTION: &str =
    "Content is too short. Consider adding more valuable information.";
pub const LONG_CONTENT_SUGGESTION: &str =
    "Content is very long. Consider breaking it into multiple pieces.";
pub const READABILITY_SUGGESTION: &str =
    "Consider using shorter sentences to improve readability.";

static HTML_TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]*>").ok());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub seo_score: u32,
    pub suggestions: Vec<String>,
    pub word_count: usize,
    /// Keyword to percentage of total words.
    pub keyword_density: BTreeMap<String, f64>,
    pub readability_score: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContentAnalyzer;

impl ContentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str, keywords: &[String]) -> ContentAnalysis {
        let word_count = text.split_whitespace().count();
        let lowered = text.to_lowercase();

        let mut score = BASE_SCORE;
        let mut suggestions = Vec::new();
        let mut keyword_density = BTreeMap::new();

        for keyword in distinct_keywords(keywords) {
            let density = if word_count == 0 {
                0.0
            } else {
                let occurrences = lowered.matches(&keyword.to_lowercase()).count();
                occurrences as f64 / word_count as f64 * 100.0
            };

            if density < MIN_KEYWORD_DENSITY {
                suggestions.push(format!(
                    "Increase usage of keyword \"{}\" (current: {:.2}%)",
                    keyword, density
                ));
                score -= 5;
            } else if density > MAX_KEYWORD_DENSITY {
                suggestions.push(format!(
                    "Reduce usage of keyword \"{}\" to avoid over-optimization (current: {:.2}%)",
                    keyword, density
                ));
                score -= 3;
            } else {
                score += 5;
            }

            keyword_density.insert(keyword.to_string(), density);
        }

        if word_count < MIN_WORD_COUNT {
            suggestions.push(SHORT_CONTENT_SUGGESTION.to_string());
            score -= 10;
        } else if word_count > MAX_WORD_COUNT {
            suggestions.push(LONG_CONTENT_SUGGESTION.to_string());
            score -= 5;
        }

        let readability_score = readability(text, word_count);
        if word_count > 0 && readability_score < READABILITY_WARNING_THRESHOLD {
            suggestions.push(READABILITY_SUGGESTION.to_string());
        }

        ContentAnalysis {
            seo_score: score.clamp(0, 100) as u32,
            suggestions,
            word_count,
            keyword_density,
            readability_score,
        }
    }
}

/// Trimmed, non-empty keywords in first-seen order without repeats.
fn distinct_keywords(keywords: &[String]) -> Vec<&str> {
    let mut seen = Vec::new();
    for keyword in keywords.iter().map(|k| k.trim()) {
        if !keyword.is_empty() && !seen.contains(&keyword) {
            seen.push(keyword);
        }
    }
    seen
}

/// Number of non-empty `.`/`!`/`?`-delimited segments, at least one.
pub fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|segment| !segment.trim().is_empty())
        .count()
        .max(1)
}

fn readability(text: &str, word_count: usize) -> f64 {
    let average_words = word_count as f64 / sentence_count(text) as f64;
    (100.0 - 1.5 * average_words).clamp(0.0, 100.0)
}

/// Removes markup so HTML output is scored on its visible words.
pub fn strip_html(text: &str) -> String {
    match HTML_TAG.as_ref() {
        Some(tag) => tag.replace_all(text, " ").into_owned(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize, per_sentence: usize) -> String {
        (0..n)
            .map(|i| {
                if (i + 1) % per_sentence == 0 {
                    "word.".to_string()
                } else {
                    "word".to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_short_text_without_keyword_scores_55() {
        let text = words(250, 10);
        let analysis = ContentAnalyzer::new().analyze(&text, &["foo".to_string()]);

        assert_eq!(analysis.word_count, 250);
        assert_eq!(analysis.seo_score, 55);
        assert_eq!(analysis.keyword_density["foo"], 0.0);
        assert!(
            analysis
                .suggestions
                .iter()
                .any(|s| s.starts_with("Increase usage of keyword \"foo\""))
        );
        assert!(
            analysis
                .suggestions
                .contains(&SHORT_CONTENT_SUGGESTION.to_string())
        );
    }

    #[test]
    fn test_healthy_density_earns_points() {
        // 400 words, 4 of them the keyword: 1% density
        let mut text = words(396, 12);
        text.push_str(" Coffee coffee COFFEE coffee.");
        let analysis = ContentAnalyzer::new().analyze(&text, &["coffee".to_string()]);

        assert_eq!(analysis.word_count, 400);
        assert!((analysis.keyword_density["coffee"] - 1.0).abs() < 1e-9);
        assert_eq!(analysis.seo_score, 75);
        assert!(analysis.suggestions.is_empty());
    }

    #[test]
    fn test_stuffed_keyword_is_penalised() {
        let text = "seo ".repeat(20) + &words(380, 10);
        let analysis = ContentAnalyzer::new().analyze(&text, &["seo".to_string()]);

        assert!((analysis.keyword_density["seo"] - 5.0).abs() < 1e-9);
        assert_eq!(analysis.seo_score, 67);
        assert!(analysis.suggestions[0].contains("(current: 5.00%)"));
    }

    #[test]
    fn test_long_content_suggestion() {
        let text = words(3001, 10);
        let analysis = ContentAnalyzer::new().analyze(&text, &[]);
        assert_eq!(analysis.seo_score, 65);
        assert_eq!(analysis.suggestions, vec![LONG_CONTENT_SUGGESTION.to_string()]);
    }

    #[test]
    fn test_score_is_clamped_at_zero() {
        let keywords: Vec<String> = (0..20).map(|i| format!("missing{}", i)).collect();
        let analysis = ContentAnalyzer::new().analyze("tiny text", &keywords);
        assert_eq!(analysis.seo_score, 0);
    }

    #[test]
    fn test_readability_from_sentence_length() {
        // 20 words per sentence: 100 - 30 = 70
        let text = words(400, 20);
        let analysis = ContentAnalyzer::new().analyze(&text, &[]);
        assert!((analysis.readability_score - 70.0).abs() < 1e-9);

        // A single 400 word sentence bottoms out at 0 and earns a suggestion
        let run_on = "word ".repeat(400);
        let analysis = ContentAnalyzer::new().analyze(&run_on, &[]);
        assert_eq!(analysis.readability_score, 0.0);
        assert!(analysis.suggestions.contains(&READABILITY_SUGGESTION.to_string()));
        assert_eq!(analysis.seo_score, 70);
    }

    #[test]
    fn test_empty_text() {
        let analysis = ContentAnalyzer::new().analyze("", &["foo".to_string()]);
        assert_eq!(analysis.word_count, 0);
        assert_eq!(analysis.keyword_density["foo"], 0.0);
        assert_eq!(analysis.readability_score, 100.0);
    }

    #[test]
    fn test_duplicate_and_blank_keywords_are_scored_once() {
        let keywords = vec!["foo".to_string(), " foo ".to_string(), "".to_string()];
        let analysis = ContentAnalyzer::new().analyze(&words(250, 10), &keywords);
        assert_eq!(analysis.keyword_density.len(), 1);
        assert_eq!(analysis.seo_score, 55);
    }

    #[test]
    fn test_sentence_count_ignores_empty_segments() {
        assert_eq!(sentence_count("One. Two! Three?"), 3);
        assert_eq!(sentence_count("Wait... what?!"), 2);
        assert_eq!(sentence_count("no terminator"), 1);
        assert_eq!(sentence_count(""), 1);
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<h2>Title</h2><p>Body</p>")
                .split_whitespace()
                .collect::<Vec<_>>(),
            vec!["Title", "Body"]
        );
    }
}
