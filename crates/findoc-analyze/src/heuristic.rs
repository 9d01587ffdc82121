//! Rule-based analysis — the no-network fallback.
//!
//! Pure pattern matching over extracted text. Positional selection only,
//! no scoring or reranking.

use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

static INSIGHT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["revenue", "profit", "margin", "guidance", "risk"]
        .iter()
        .map(|kw| Regex::new(&format!(r"(?i){}[^\n.]*", kw)).unwrap())
        .collect()
});

static RISK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)risk|uncertain|challenge|headwind|pressure").unwrap());

static BUY_SIGNAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)strong\s+growth|beat|raised\s+guidance|record").unwrap());
static HOLD_SIGNAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)flat|mixed|inline").unwrap());
static SELL_SIGNAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)miss|decline|lowered\s+guidance|weak").unwrap());

/// First `max_sentences` non-empty sentences, joined by single spaces.
/// Sentences keep their terminating punctuation.
pub fn summarize(text: &str, max_sentences: usize) -> String {
    let mut sentences: Vec<&str> = Vec::new();
    let mut last = 0;
    for m in SENTENCE_BOUNDARY.find_iter(text) {
        // The terminator is a single ASCII char; keep it with the sentence.
        let end = m.start() + 1;
        sentences.push(&text[last..end]);
        last = m.end();
    }
    sentences.push(&text[last..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(max_sentences)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First match of each keyword pattern (revenue, profit, margin, guidance,
/// risk) up to the next sentence boundary, in pattern order. When nothing
/// matches and the text is non-empty, falls back to the first `top_k`
/// non-empty lines.
pub fn extract_insights(text: &str, top_k: usize) -> Vec<String> {
    let mut findings: Vec<String> = INSIGHT_PATTERNS
        .iter()
        .filter_map(|p| p.find(text).map(|m| m.as_str().trim().to_string()))
        .collect();

    if findings.is_empty() && !text.is_empty() {
        findings = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(top_k)
            .map(str::to_string)
            .collect();
    }

    findings.truncate(top_k);
    findings
}

/// Lines mentioning risk-related keywords, in original order. Falls back to
/// `extract_insights` when no line matches.
pub fn extract_risks(text: &str, top_k: usize) -> Vec<String> {
    let mut risks: Vec<String> = text
        .lines()
        .filter(|line| RISK_LINE.is_match(line))
        .map(|line| line.trim().to_string())
        .collect();

    if risks.is_empty() && !text.is_empty() {
        risks = extract_insights(text, top_k);
    }

    risks.truncate(top_k);
    risks
}

/// Keyword-trigger recommendations. All matching triggers fire, in fixed
/// Buy/Hold/Sell order; they are not mutually exclusive.
pub fn recommendations(text: &str, top_k: usize) -> Vec<String> {
    let mut recs: Vec<String> = Vec::new();
    if BUY_SIGNAL.is_match(text) {
        recs.push("Consider Buy based on reported strength and guidance".to_string());
    }
    if HOLD_SIGNAL.is_match(text) {
        recs.push("Consider Hold pending further catalysts".to_string());
    }
    if SELL_SIGNAL.is_match(text) {
        recs.push("Consider Sell due to weakness and risks".to_string());
    }
    if recs.is_empty() {
        recs.push("Further analysis required; consider Neutral/Hold".to_string());
    }
    recs.truncate(top_k);
    recs
}

/// Synthetic reference placeholders, one per insight up to five. These carry
/// no citation semantics; a known limitation of the heuristic backend.
pub fn references(insights: &[String]) -> Vec<String> {
    (1..=insights.len().min(5))
        .map(|i| format!("snippet:{}", i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EARNINGS: &str = "Revenue grew 20% year over year. Profit margin expanded to 31%. \
                            Management raised guidance for the full year.\n\
                            Risk: supply chain pressure persists.\n\
                            The board declared a dividend.";

    #[test]
    fn summarize_caps_at_five_verbatim_sentences() {
        let text = "One. Two. Three. Four. Five. Six. Seven.";
        let summary = summarize(text, 5);
        assert_eq!(summary, "One. Two. Three. Four. Five.");
        for sentence in ["One.", "Two.", "Three.", "Four.", "Five."] {
            assert!(text.contains(sentence));
        }
    }

    #[test]
    fn summarize_handles_short_text() {
        assert_eq!(summarize("Just one sentence", 5), "Just one sentence");
        assert_eq!(summarize("", 5), "");
    }

    #[test]
    fn insights_follow_pattern_order() {
        let insights = extract_insights(EARNINGS, 5);
        assert!(insights[0].to_lowercase().starts_with("revenue"));
        assert!(insights.iter().any(|i| i.to_lowercase().starts_with("profit")));
        assert!(insights.iter().any(|i| i.to_lowercase().starts_with("risk")));
        assert!(insights.len() <= 5);
    }

    #[test]
    fn insights_fall_back_to_leading_lines() {
        let text = "alpha line\nbeta line\ngamma line";
        assert_eq!(
            extract_insights(text, 2),
            vec!["alpha line".to_string(), "beta line".to_string()]
        );
    }

    #[test]
    fn insights_empty_for_empty_text() {
        assert!(extract_insights("", 5).is_empty());
    }

    #[test]
    fn risks_pick_matching_lines_in_order() {
        let risks = extract_risks(EARNINGS, 5);
        assert_eq!(risks, vec!["Risk: supply chain pressure persists.".to_string()]);
    }

    #[test]
    fn risks_fall_back_to_insights_when_no_line_matches() {
        let text = "Revenue was steady.\nThe office moved.";
        assert_eq!(extract_risks(text, 3), extract_insights(text, 3));
    }

    #[test]
    fn buy_and_sell_triggers_both_fire_in_order() {
        let text = "The company beat estimates but will miss next quarter.";
        let recs = recommendations(text, 3);
        assert_eq!(
            recs,
            vec![
                "Consider Buy based on reported strength and guidance".to_string(),
                "Consider Sell due to weakness and risks".to_string(),
            ]
        );
    }

    #[test]
    fn recommendations_truncate_to_top_k() {
        let text = "beat, flat, and miss all at once";
        assert_eq!(recommendations(text, 2).len(), 2);
    }

    #[test]
    fn neutral_recommendation_when_nothing_triggers() {
        assert_eq!(
            recommendations("Nothing notable happened.", 3),
            vec!["Further analysis required; consider Neutral/Hold".to_string()]
        );
    }

    #[test]
    fn references_length_tracks_insights() {
        let insights: Vec<String> = (0..7).map(|i| format!("insight {}", i)).collect();
        assert_eq!(references(&insights).len(), 5);
        assert_eq!(references(&insights[..2]).len(), 2);
        assert_eq!(references(&insights[..2]), vec!["snippet:1", "snippet:2"]);
        assert!(references(&[]).is_empty());
    }
}
