//! Question Suite: 15 fixed universal + up to 5 derived + up to 5 custom
//! questions. Derived fresh per run from site metadata; stable given
//! the same metadata.

use crate::ids::QuestionId;
use crate::types::{Question, QuestionSource, Site};

struct UniversalTemplate {
    text: &'static str,
    category: &'static str,
    difficulty: f64,
    weight: f64,
    expected_signals: &'static [&'static str],
}

const UNIVERSAL_QUESTIONS: &[UniversalTemplate] = &[
    UniversalTemplate { text: "What does {brand} do?", category: "overview", difficulty: 0.2, weight: 1.0, expected_signals: &[] },
    UniversalTemplate { text: "How do I contact {brand}?", category: "contact", difficulty: 0.2, weight: 1.0, expected_signals: &["email", "phone"] },
    UniversalTemplate { text: "Where is {brand} located?", category: "contact", difficulty: 0.3, weight: 0.8, expected_signals: &["address"] },
    UniversalTemplate { text: "How much does {brand} cost?", category: "pricing", difficulty: 0.3, weight: 1.0, expected_signals: &["pricing"] },
    UniversalTemplate { text: "What plans does {brand} offer?", category: "pricing", difficulty: 0.4, weight: 0.8, expected_signals: &["pricing"] },
    UniversalTemplate { text: "Who founded {brand}?", category: "authority", difficulty: 0.5, weight: 0.6, expected_signals: &["founding_year"] },
    UniversalTemplate { text: "When was {brand} founded?", category: "authority", difficulty: 0.4, weight: 0.6, expected_signals: &["founding_year"] },
    UniversalTemplate { text: "What do customers say about {brand}?", category: "trust", difficulty: 0.5, weight: 0.7, expected_signals: &["testimonial", "social_proof"] },
    UniversalTemplate { text: "What integrations does {brand} support?", category: "product", difficulty: 0.5, weight: 0.6, expected_signals: &["integration"] },
    UniversalTemplate { text: "Does {brand} have an FAQ?", category: "support", difficulty: 0.3, weight: 0.6, expected_signals: &[] },
    UniversalTemplate { text: "What is {brand}'s refund policy?", category: "policy", difficulty: 0.5, weight: 0.6, expected_signals: &[] },
    UniversalTemplate { text: "Is {brand} a legitimate, established company?", category: "authority", difficulty: 0.4, weight: 0.7, expected_signals: &["social_proof"] },
    UniversalTemplate { text: "What industries does {brand} serve?", category: "overview", difficulty: 0.4, weight: 0.6, expected_signals: &[] },
    UniversalTemplate { text: "How does {brand} compare to competitors?", category: "competitive", difficulty: 0.7, weight: 0.5, expected_signals: &[] },
    UniversalTemplate { text: "What is {brand}'s latest update or news?", category: "freshness", difficulty: 0.6, weight: 0.5, expected_signals: &["founding_year"] },
];

fn brand_token(site: &Site) -> String {
    site.domain
        .split('.')
        .next()
        .unwrap_or(&site.domain)
        .to_string()
}

pub fn universal_questions(site: &Site) -> Vec<Question> {
    let brand = brand_token(site);
    UNIVERSAL_QUESTIONS
        .iter()
        .map(|tpl| Question {
            question_id: QuestionId::new(),
            source: QuestionSource::Universal,
            text: tpl.text.replace("{brand}", &brand),
            category: tpl.category.to_string(),
            difficulty: tpl.difficulty,
            weight: tpl.weight,
            expected_signals: tpl.expected_signals.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

/// Derived questions are deterministic given the same site metadata: one per
/// configured competitor (comparison question) up to a cap of 5, so the same
/// `Site` always yields the same derived set (stability requirement).
pub fn derived_questions(site: &Site) -> Vec<Question> {
    let brand = brand_token(site);
    site.competitors
        .iter()
        .take(5)
        .map(|competitor| Question {
            question_id: QuestionId::new(),
            source: QuestionSource::Derived,
            text: format!("How does {brand} compare to {competitor}?"),
            category: "competitive".to_string(),
            difficulty: 0.7,
            weight: 0.5,
            expected_signals: vec![],
        })
        .collect()
}

pub fn custom_questions(texts: &[String]) -> Vec<Question> {
    texts
        .iter()
        .take(5)
        .map(|text| Question {
            question_id: QuestionId::new(),
            source: QuestionSource::Custom,
            text: text.clone(),
            category: "custom".to_string(),
            difficulty: 0.5,
            weight: 1.0,
            expected_signals: vec![],
        })
        .collect()
}

pub fn build_question_suite(site: &Site, custom_texts: &[String]) -> Vec<Question> {
    let mut suite = universal_questions(site);
    suite.extend(derived_questions(site));
    suite.extend(custom_questions(custom_texts));
    suite
}
