//! Schema pillar: JSON-LD structured data coverage and validity.

use super::{component, finalize, PillarInput};
use crate::ids::RunId;
use crate::types::{Issue, Page, Pillar, PillarScore, ProgressLevel, SchemaType};

pub fn analyze(run_id: RunId, input: &PillarInput) -> PillarScore {
    let pages = input.pages;
    let mut issues = Vec::new();

    let faq_score = coverage_score(pages, |p| p.schema.iter().any(|s| s.schema_type == SchemaType::FaqPage));
    let article_author_score = coverage_score(pages, |p| {
        p.schema.iter().any(|s| s.schema_type == SchemaType::Article && s.has_author)
    });
    let date_modified_score = coverage_score(pages, |p| p.schema.iter().any(|s| s.has_date_modified));
    let organization_score = coverage_score(pages, |p| p.schema.iter().any(|s| s.schema_type == SchemaType::Organization));
    let howto_score = coverage_score(pages, |p| p.schema.iter().any(|s| s.schema_type == SchemaType::HowTo));
    let validation_score = validation_score(pages);

    if validation_score < 100.0 {
        issues.push(Issue {
            code: "invalid_schema_objects".to_string(),
            level: ProgressLevel::from_raw(validation_score),
            message: "one or more JSON-LD schema objects failed to validate".to_string(),
        });
    }
    if organization_score < 50.0 {
        issues.push(Issue {
            code: "missing_organization_schema".to_string(),
            level: ProgressLevel::from_raw(organization_score),
            message: "no Organization schema found anywhere on the site".to_string(),
        });
    }

    let components = vec![
        component("faq_page", 27.0, faq_score),
        component("article_author", 20.0, article_author_score),
        component("date_modified", 20.0, date_modified_score),
        component("organization", 13.0, organization_score),
        component("howto", 13.0, howto_score),
        component("validation", 7.0, validation_score),
    ];

    finalize(run_id, Pillar::Schema, components, issues)
}

fn coverage_score(pages: &[Page], predicate: impl Fn(&Page) -> bool) -> f64 {
    if pages.is_empty() {
        return 0.0;
    }
    let matching = pages.iter().filter(|p| predicate(p)).count();
    100.0 * matching as f64 / pages.len() as f64
}

fn validation_score(pages: &[Page]) -> f64 {
    let total: usize = pages.iter().map(|p| p.schema.len()).sum();
    if total == 0 {
        return 0.0;
    }
    let valid: usize = pages.iter().flat_map(|p| &p.schema).filter(|s| s.valid).count();
    100.0 * valid as f64 / total as f64
}
