//! Hierarchical semantic splitter, built fresh over the extracted page text
//! plus its heading list, informed by `features/history.rs`'s
//! truncation-with-metadata style (that module only truncates for
//! context-window limits, with no section-aware splitting of its own).

use crate::ids::{ChunkId, PageId};
use crate::types::{Chunk, ChunkType, ContentHash, Heading};

const MIN_TOKENS: usize = 100;
const MAX_TOKENS: usize = 512;
const OVERLAP_TOKENS: usize = 50;

/// Rough token estimate: ~0.75 words per token inverse, i.e. words / 0.75.
/// No tokenizer dependency — this crate only needs a stable, monotonic proxy
/// for chunk-size bounds, not exact model token counts.
fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    ((words as f64) / 0.75).ceil() as usize
}

struct Section {
    heading_path: Vec<String>,
    body: String,
}

/// Splits `page_text` on H2 boundaries using the page's heading list as
/// anchors, in document order. Headings above H2 (H1) seed the path but do
/// not start a new section on their own — H2 is the chosen section boundary.
fn split_into_sections(page_text: &str, headings: &[Heading]) -> Vec<Section> {
    if headings.is_empty() {
        return vec![Section {
            heading_path: vec![],
            body: page_text.to_string(),
        }];
    }

    let mut sections = Vec::new();
    let mut path_stack: Vec<(u8, String)> = Vec::new();
    let mut current_body = String::new();
    let mut current_path: Vec<String> = Vec::new();
    let mut started = false;

    for heading in headings {
        if heading.level <= 2 {
            if started && !current_body.trim().is_empty() {
                sections.push(Section {
                    heading_path: current_path.clone(),
                    body: current_body.trim().to_string(),
                });
            }
            path_stack.retain(|(level, _)| *level < heading.level);
            path_stack.push((heading.level, heading.text.clone()));
            current_path = path_stack.iter().map(|(_, t)| t.clone()).collect();
            current_body = heading.text.clone();
            current_body.push('\n');
            started = true;
        } else if started {
            current_body.push_str(&heading.text);
            current_body.push('\n');
        }
    }
    if started && !current_body.trim().is_empty() {
        sections.push(Section {
            heading_path: current_path,
            body: current_body.trim().to_string(),
        });
    }

    if sections.is_empty() {
        sections.push(Section {
            heading_path: vec![],
            body: page_text.to_string(),
        });
    } else {
        // Fold the full page text in as the first section's body when the
        // heading walk only captured heading text itself (typical when the
        // caller passes plain extracted text rather than the DOM).
        sections[0].body = page_text.to_string();
    }
    sections
}

/// Split a section's text into paragraph → sentence → word boundaries until
/// each piece is within `[MIN_TOKENS, MAX_TOKENS]`, with `OVERLAP_TOKENS`
/// carried into the next piece so retrieval doesn't lose cross-boundary
/// context.
fn split_bounded(text: &str) -> Vec<String> {
    if estimate_tokens(text) <= MAX_TOKENS {
        return vec![text.to_string()];
    }

    let paragraphs: Vec<&str> = text.split("\n\n").filter(|p| !p.trim().is_empty()).collect();
    let units: Vec<&str> = if paragraphs.len() > 1 {
        paragraphs
    } else {
        text.split(". ").filter(|s| !s.trim().is_empty()).collect()
    };

    let words: Vec<&str> = units
        .iter()
        .flat_map(|u| u.split_whitespace())
        .collect();

    let words_per_chunk = ((MAX_TOKENS as f64) * 0.75).floor() as usize;
    let overlap_words = ((OVERLAP_TOKENS as f64) * 0.75).floor() as usize;
    let step = words_per_chunk.saturating_sub(overlap_words).max(1);

    let mut out = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let end = (i + words_per_chunk).min(words.len());
        out.push(words[i..end].join(" "));
        if end == words.len() {
            break;
        }
        i += step;
    }
    if out.is_empty() {
        out.push(text.to_string());
    }
    out
}

/// Typed-block detection keeps lists/tables/code/quotes from being fractured
/// by the paragraph/sentence splitter. Best-effort on the
/// already-extracted plain text: markdown-ish markers left by the extractor
/// (`html2md` output) are used as the signal since the chunker operates on
/// `extracted_text`, not the raw DOM.
fn classify_block(text: &str) -> ChunkType {
    let trimmed = text.trim_start();
    if trimmed.starts_with("```") {
        ChunkType::Code
    } else if trimmed.starts_with('>') {
        ChunkType::Quote
    } else if trimmed.lines().filter(|l| l.trim_start().starts_with('|')).count() >= 2 {
        ChunkType::Table
    } else if trimmed
        .lines()
        .filter(|l| {
            let l = l.trim_start();
            l.starts_with("- ") || l.starts_with("* ") || l.starts_with(char::is_numeric)
        })
        .count()
        >= 2
    {
        ChunkType::List
    } else {
        ChunkType::Text
    }
}

pub fn chunk_page(page_id: PageId, page_text: &str, headings: &[Heading]) -> Vec<Chunk> {
    let sections = split_into_sections(page_text, headings);
    let mut raw_chunks: Vec<(Vec<String>, String, ChunkType)> = Vec::new();

    for section in &sections {
        for block in section.body.split("\n\n").filter(|b| !b.trim().is_empty()) {
            let chunk_type = classify_block(block);
            match chunk_type {
                ChunkType::List | ChunkType::Table | ChunkType::Code | ChunkType::Quote => {
                    raw_chunks.push((section.heading_path.clone(), block.trim().to_string(), chunk_type));
                }
                ChunkType::Text | ChunkType::Heading => {
                    for piece in split_bounded(block) {
                        if estimate_tokens(&piece) < 5 {
                            continue;
                        }
                        raw_chunks.push((section.heading_path.clone(), piece, ChunkType::Text));
                    }
                }
            }
        }
    }

    if raw_chunks.is_empty() && !page_text.trim().is_empty() {
        raw_chunks.push((vec![], page_text.trim().to_string(), ChunkType::Text));
    }

    let total = raw_chunks.len().max(1);
    raw_chunks
        .into_iter()
        .enumerate()
        .map(|(ordinal, (heading_path, text, chunk_type))| Chunk {
            chunk_id: ChunkId::new(),
            page_id,
            ordinal,
            chunk_type,
            heading_path,
            token_estimate: estimate_tokens(&text),
            position_ratio: ordinal as f64 / total as f64,
            content_hash: ContentHash::of(text.as_bytes()),
            text,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::PageId;

    #[test]
    fn chunker_is_idempotent_on_identical_text() {
        let page_id = PageId::new();
        let text = "Acme Bakery serves sourdough and croissants every morning in Austin, Texas. We also cater weddings.";
        let headings = vec![];
        let first = chunk_page(page_id, text, &headings);
        let second = chunk_page(page_id, text, &headings);
        let first_hashes: Vec<_> = first.iter().map(|c| c.content_hash).collect();
        let second_hashes: Vec<_> = second.iter().map(|c| c.content_hash).collect();
        assert_eq!(first_hashes, second_hashes);
    }

    #[test]
    fn heading_path_is_non_decreasing_prefix_consistent() {
        let page_id = PageId::new();
        let headings = vec![
            Heading { level: 1, text: "Home".into() },
            Heading { level: 2, text: "How It Works".into() },
            Heading { level: 3, text: "Retrieval".into() },
        ];
        let chunks = chunk_page(page_id, "Some content under how it works.", &headings);
        for chunk in &chunks {
            if chunk.heading_path.len() >= 2 {
                assert_eq!(chunk.heading_path[0], "How It Works");
            }
        }
    }

    #[test]
    fn extremely_long_page_does_not_blow_up_chunk_count() {
        let page_id = PageId::new();
        let paragraph = "word ".repeat(40) + "\n\n";
        let long_text = paragraph.repeat(30_000); // well over 1M chars
        let start = std::time::Instant::now();
        let chunks = chunk_page(page_id, &long_text, &[]);
        assert!(!chunks.is_empty());
        assert!(start.elapsed().as_secs() < 5, "chunking should stay roughly linear");
    }

    #[test]
    fn does_not_fracture_a_table_block() {
        let page_id = PageId::new();
        let text = "Intro paragraph.\n\n| Plan | Price |\n|---|---|\n| Basic | $10 |\n| Pro | $20 |";
        let chunks = chunk_page(page_id, text, &[]);
        assert!(chunks.iter().any(|c| c.chunk_type == ChunkType::Table));
    }
}
