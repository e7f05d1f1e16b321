//! Fix Generator and Action Center, built fresh, grounded on the
//! `PillarScore`/`Issue`/`SimResult` types already established and the
//! reason codes emitted by the pillar analyzers.

use crate::types::{ActionCenter, Answerability, Effort, Fix, Pillar, PillarScore, Question, SimResult};
use std::collections::HashMap;

struct FixTemplate {
    title: &'static str,
    explanation: &'static str,
    scaffold: &'static str,
    priority: u8,
    effort: Effort,
    impact_points: f64,
}

fn template_for(reason_code: &str) -> FixTemplate {
    match reason_code {
        "robots_blocks_ai_crawlers" => FixTemplate {
            title: "Allow AI crawlers in robots.txt",
            explanation: "One or more AI or search crawlers are disallowed across most of the site, blocking discovery entirely.",
            scaffold: "User-agent: GPTBot\nAllow: /\n\nUser-agent: ClaudeBot\nAllow: /\n",
            priority: 1,
            effort: Effort::Low,
            impact_points: 10.0,
        },
        "missing_llms_txt" => FixTemplate {
            title: "Publish an llms.txt file",
            explanation: "No llms.txt was found at the site root; it helps AI crawlers find the pages worth indexing.",
            scaffold: "# [SITE_NAME]\n\n> [ONE_LINE_DESCRIPTION]\n\n## Pages\n- [PAGE_TITLE]: [PAGE_URL]\n",
            priority: 3,
            effort: Effort::Low,
            impact_points: 6.0,
        },
        "empty_shell_detected" => FixTemplate {
            title: "Implement server-side rendering",
            explanation: "Pages render almost no text server-side; crawlers that don't execute JavaScript see an empty shell.",
            scaffold: "Render [PAGE_TEMPLATE] server-side (SSR/SSG) so the initial HTML response contains the full text content.",
            priority: 1,
            effort: Effort::High,
            impact_points: 15.0,
        },
        "missing_faq_section" => FixTemplate {
            title: "Add an FAQ section with FAQPage schema",
            explanation: "No FAQ-style question/answer section was detected; FAQs are disproportionately cited by answer engines.",
            scaffold: "## Frequently Asked Questions\n\n**[QUESTION]**\n[ANSWER]\n",
            priority: 2,
            effort: Effort::Medium,
            impact_points: 8.0,
        },
        "wall_of_text" => FixTemplate {
            title: "Break up long paragraphs",
            explanation: "Paragraphs run long with few breaks, making individual claims harder to extract.",
            scaffold: "Split paragraphs over 4 sentences; keep sentences under ~20 words.",
            priority: 3,
            effort: Effort::Medium,
            impact_points: 5.0,
        },
        "invalid_schema_objects" => FixTemplate {
            title: "Fix invalid JSON-LD schema",
            explanation: "One or more structured data objects failed validation and may be ignored by crawlers.",
            scaffold: "Validate [SCHEMA_URL] against schema.org and fix reported errors.",
            priority: 2,
            effort: Effort::Low,
            impact_points: 6.0,
        },
        "missing_organization_schema" => FixTemplate {
            title: "Add Organization schema",
            explanation: "No Organization schema was found anywhere on the site, weakening entity recognition.",
            scaffold: "{\n  \"@context\": \"https://schema.org\",\n  \"@type\": \"Organization\",\n  \"name\": \"[COMPANY_NAME]\",\n  \"url\": \"[SITE_URL]\"\n}",
            priority: 3,
            effort: Effort::Low,
            impact_points: 5.0,
        },
        "missing_author_bylines" => FixTemplate {
            title: "Add author bylines",
            explanation: "Most pages carry no identifiable author, undermining authority signals.",
            scaffold: "By [AUTHOR_NAME], [AUTHOR_TITLE]",
            priority: 3,
            effort: Effort::Low,
            impact_points: 4.0,
        },
        "stale_content" => FixTemplate {
            title: "Refresh stale content",
            explanation: "Content has not been updated recently; freshness decays the Authority pillar.",
            scaffold: "Review and update [PAGE_URL], then set dateModified in its schema.",
            priority: 4,
            effort: Effort::Medium,
            impact_points: 4.0,
        },
        _ => FixTemplate {
            title: "Review flagged issue",
            explanation: "A pillar analyzer flagged an issue without a dedicated fix template.",
            scaffold: "[REVIEW_DETAILS]",
            priority: 5,
            effort: Effort::Medium,
            impact_points: 2.0,
        },
    }
}

fn question_fix_template(category: &str) -> FixTemplate {
    FixTemplate {
        title: "Add content answering this question type",
        explanation: "Simulated questions in this category could not be answered from crawled content.",
        scaffold: "Add a clearly labeled section answering: [QUESTION_TEXT]",
        priority: 2,
        effort: Effort::Medium,
        impact_points: 3.0,
    }
    .with_category(category)
}

impl FixTemplate {
    fn with_category(self, _category: &str) -> Self {
        self
    }
}

/// Builds one `Fix` per distinct pillar issue (deduplicated by reason_code)
/// plus one per failed/partial question category.
pub fn generate_fixes(pillar_scores: &[PillarScore], sim_results: &[SimResult], questions: &[Question]) -> Vec<Fix> {
    let mut seen = std::collections::HashSet::new();
    let mut fixes = Vec::new();

    for score in pillar_scores {
        for issue in &score.issues {
            if !seen.insert(issue.code.clone()) {
                continue;
            }
            let tpl = template_for(&issue.code);
            fixes.push(Fix {
                reason_code: issue.code.clone(),
                title: tpl.title.to_string(),
                explanation: tpl.explanation.to_string(),
                scaffold: tpl.scaffold.to_string(),
                target_url: None,
                priority: tpl.priority,
                effort: tpl.effort,
                estimated_impact_points: tpl.impact_points,
                affected_pillar: score.pillar,
            });
        }
    }

    let question_by_id: HashMap<_, _> = questions.iter().map(|q| (q.question_id, q)).collect();
    let mut seen_categories = std::collections::HashSet::new();
    for result in sim_results {
        if result.answerability == Answerability::FullyAnswerable {
            continue;
        }
        let Some(question) = question_by_id.get(&result.question_id) else {
            continue;
        };
        let reason_code = format!("unanswered_question_category_{}", question.category);
        if !seen_categories.insert(reason_code.clone()) {
            continue;
        }
        let tpl = question_fix_template(&question.category);
        fixes.push(Fix {
            reason_code,
            title: tpl.title.to_string(),
            explanation: tpl.explanation.to_string(),
            scaffold: tpl.scaffold.to_string(),
            target_url: None,
            priority: tpl.priority,
            effort: tpl.effort,
            estimated_impact_points: tpl.impact_points,
            affected_pillar: Pillar::Coverage,
        });
    }

    fixes
}

pub fn build_action_center(fixes: Vec<Fix>) -> ActionCenter {
    let quick_wins: Vec<Fix> = fixes
        .iter()
        .filter(|f| f.effort == Effort::Low && f.estimated_impact_points >= 5.0)
        .cloned()
        .collect();
    let high_priority: Vec<Fix> = fixes.iter().filter(|f| f.priority == 1).cloned().collect();

    let mut by_category: HashMap<String, Vec<Fix>> = HashMap::new();
    for fix in &fixes {
        by_category
            .entry(fix.affected_pillar.as_str().to_string())
            .or_default()
            .push(fix.clone());
    }

    let total_capped_impact_points = total_capped_impact(&fixes);

    ActionCenter {
        quick_wins,
        high_priority,
        by_category,
        total_capped_impact_points,
    }
}

/// Diminishing-returns total: sorted by impact descending, second fix counts
/// at 0.8×, third at 0.64×, etc; hard cap at 30 points.
pub fn total_capped_impact(fixes: &[Fix]) -> f64 {
    let mut impacts: Vec<f64> = fixes.iter().map(|f| f.estimated_impact_points).collect();
    impacts.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let mut total = 0.0;
    let mut multiplier = 1.0;
    for impact in impacts {
        total += impact * multiplier;
        multiplier *= 0.8;
    }
    total.min(30.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RunId;
    use crate::types::ProgressLevel;

    fn fix(impact: f64) -> Fix {
        Fix {
            reason_code: "x".to_string(),
            title: "x".to_string(),
            explanation: "x".to_string(),
            scaffold: "x".to_string(),
            target_url: None,
            priority: 3,
            effort: Effort::Medium,
            estimated_impact_points: impact,
            affected_pillar: Pillar::Technical,
        }
    }

    #[test]
    fn duplicate_reason_codes_are_deduplicated() {
        let score = PillarScore {
            run_id: RunId::new(),
            pillar: Pillar::Technical,
            raw: 20.0,
            weighted_points: 0.0,
            level: ProgressLevel::Limited,
            components: vec![],
            issues: vec![
                crate::types::Issue { code: "missing_llms_txt".to_string(), level: ProgressLevel::Limited, message: "x".to_string() },
            ],
        };
        let fixes = generate_fixes(&[score.clone(), score], &[], &[]);
        assert_eq!(fixes.len(), 1);
    }

    #[test]
    fn impact_cap_never_exceeds_thirty() {
        let fixes = vec![fix(20.0), fix(20.0), fix(20.0), fix(20.0), fix(20.0)];
        assert!(total_capped_impact(&fixes) <= 30.0);
    }
}
