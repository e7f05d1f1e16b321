//! Named-pattern signal matching. Signals are not literal
//! substrings; each signal name maps to a regex family OR a fuzzy token
//! match. Compiled-once statics via `OnceLock`, mirroring the
//! compiled-once `Selector` statics in the `scraper`-based extraction code.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

pub struct SignalMatch {
    pub found: bool,
    pub evidence: Option<String>,
}

fn pattern_families() -> &'static HashMap<&'static str, Regex> {
    static FAMILIES: OnceLock<HashMap<&'static str, Regex>> = OnceLock::new();
    FAMILIES.get_or_init(|| {
        let mut m = HashMap::new();
        m.insert("email", Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
        // At least 7 digits, excluding percentage-like sequences ("50% off").
        m.insert(
            "phone",
            Regex::new(r"(?:\+?\d[\s.\-]?){7,}\d(?!\s*%)").unwrap(),
        );
        m.insert(
            "address",
            Regex::new(r"(?i)\d{1,5}\s+[A-Za-z0-9.\s]{3,40}\b(?:street|st\.?|avenue|ave\.?|road|rd\.?|blvd|suite|drive|dr\.?)\b").unwrap(),
        );
        m.insert(
            "pricing",
            Regex::new(r"(?:[$€£]\s?\d[\d,]*(?:\.\d{2})?|\d+\s?(?:usd|eur|gbp)\b)").unwrap(),
        );
        m.insert(
            "testimonial",
            Regex::new(r#"(?i)["“][^"”]{15,240}["”]\s*[—-]\s*[A-Z][a-z]+"#).unwrap(),
        );
        m.insert(
            "founding_year",
            Regex::new(r"(?i)\b(?:founded|established|since)\b[^.\n]{0,20}\b(19|20)\d{2}\b").unwrap(),
        );
        m.insert(
            "social_proof",
            Regex::new(r"(?i)\b(\d[\d,]*\+?\s+(?:customers|clients|users|companies|businesses)|trusted by|as seen in)\b").unwrap(),
        );
        m.insert(
            "integration",
            Regex::new(r"(?i)\bintegrat(?:es?|ion|ions)\s+with\b").unwrap(),
        );
        m
    })
}

fn find_evidence(re: &Regex, text: &str) -> Option<String> {
    re.find(text).map(|m| m.as_str().to_string())
}

/// Evaluates one named signal against `text`. If the name matches a known
/// regex family, matching is `found = regex_hits > 0`; otherwise it falls
/// back to fuzzy token matching of the signal phrase itself.
pub fn evaluate_signal(signal_name: &str, text: &str) -> SignalMatch {
    if let Some(re) = pattern_families().get(signal_name) {
        return match find_evidence(re, text) {
            Some(evidence) => SignalMatch { found: true, evidence: Some(evidence) },
            None => SignalMatch { found: false, evidence: None },
        };
    }
    fuzzy_token_match(signal_name, text)
}

/// `found = (matched_words / total_words) ≥ 0.6` AND each matched word has
/// length ≥ 3; evidence is the substring of the first match window.
fn fuzzy_token_match(phrase: &str, text: &str) -> SignalMatch {
    let phrase_words: Vec<String> = phrase
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() >= 3)
        .collect();
    if phrase_words.is_empty() {
        return SignalMatch { found: false, evidence: None };
    }

    let text_lower = text.to_lowercase();
    let text_words: Vec<&str> = text_lower.split_whitespace().collect();

    let matched = phrase_words.iter().filter(|w| text_words.contains(&w.as_str())).count();
    let ratio = matched as f64 / phrase_words.len() as f64;
    let found = ratio >= 0.6;

    let evidence = if found {
        first_match_window(&text_words, &phrase_words)
    } else {
        None
    };

    SignalMatch { found, evidence }
}

fn first_match_window(text_words: &[&str], phrase_words: &[String]) -> Option<String> {
    for (i, word) in text_words.iter().enumerate() {
        if phrase_words.iter().any(|p| p == word) {
            let end = (i + 8).min(text_words.len());
            return Some(text_words[i..end].join(" "));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_evidence_always_matches_with_evidence() {
        let m = evaluate_signal("email", "Contact us at hello@acme.com for catering orders.");
        assert!(m.found);
        assert_eq!(m.evidence.unwrap(), "hello@acme.com");
    }

    #[test]
    fn phone_pattern_ignores_percentages() {
        let m = evaluate_signal("phone", "Save 50% off your first order today.");
        assert!(!m.found);
    }

    #[test]
    fn phone_pattern_matches_real_numbers() {
        let m = evaluate_signal("phone", "Call us at +1 512-555-0134 any time.");
        assert!(m.found);
    }

    #[test]
    fn fuzzy_match_requires_sixty_percent_word_overlap() {
        let m = evaluate_signal("great customer service team", "our great customer support crew is here");
        assert!(!m.found);
        let m2 = evaluate_signal("great customer service team", "our great customer service team is here to help");
        assert!(m2.found);
    }
}
