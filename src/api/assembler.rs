//! Grounding context assembly
//!
//! Turns ranked retrieval results into a single size-bounded context string
//! plus a deduplicated source list. Passages are included greedily in score
//! order; a passage that alone exceeds the budget is truncated rather than
//! dropped, so the context is never empty when retrieval found anything.

use crate::ml::ScoredChunk;
use serde::{Deserialize, Serialize};

/// Separator placed between passages in the assembled context
const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// A deduplicated source reference returned alongside answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Source page URL
    pub url: String,

    /// Source page title
    pub title: String,
}

/// The grounding context handed to the generation backend
#[derive(Debug, Clone)]
pub struct AssembledContext {
    /// Concatenated passages, at most `max_context_size` characters
    pub context: String,

    /// Unique (url, title) pairs in first-encounter order
    pub sources: Vec<SourceRef>,
}

/// Assemble a grounding context from ranked retrieval results.
///
/// `max_context_size` is a character budget over the full context string,
/// separators included. `max_chunks` caps how many passages are considered
/// regardless of remaining budget.
pub fn assemble(
    results: &[ScoredChunk],
    max_context_size: usize,
    max_chunks: usize,
) -> AssembledContext {
    let mut context = String::new();
    let mut used_chars = 0usize;

    for chunk in results.iter().take(max_chunks) {
        let chunk_chars = chunk.text.chars().count();
        let separator_chars = if context.is_empty() {
            0
        } else {
            PASSAGE_SEPARATOR.chars().count()
        };

        if used_chars + separator_chars + chunk_chars > max_context_size {
            if context.is_empty() && max_context_size > 0 {
                // A lone oversize passage is truncated, not dropped.
                context = chunk.text.chars().take(max_context_size).collect();
            }
            break;
        }

        if !context.is_empty() {
            context.push_str(PASSAGE_SEPARATOR);
        }
        context.push_str(&chunk.text);
        used_chars += separator_chars + chunk_chars;
    }

    // Sources are deduplicated over the full result set, so callers can cite
    // every page retrieval considered, in first-encounter order.
    let mut sources: Vec<SourceRef> = Vec::new();
    for chunk in results {
        let source = SourceRef {
            url: chunk.source.url.clone(),
            title: chunk.source.title.clone(),
        };
        if !sources.contains(&source) {
            sources.push(source);
        }
    }

    AssembledContext { context, sources }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::ChunkSource;

    fn scored(text: &str, url: &str, title: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            text: text.to_string(),
            source: ChunkSource::new(url, title, "kenyalaw.org"),
            score,
        }
    }

    #[test]
    fn test_budget_never_exceeded() {
        let results = vec![
            scored(&"a".repeat(40), "https://kenyalaw.org/1", "One", 0.9),
            scored(&"b".repeat(40), "https://kenyalaw.org/2", "Two", 0.8),
            scored(&"c".repeat(40), "https://kenyalaw.org/3", "Three", 0.7),
        ];

        let assembled = assemble(&results, 100, 10);
        assert!(assembled.context.chars().count() <= 100);
        // First two fit (40 + 7 + 40 = 87); the third would overflow.
        assert!(assembled.context.contains('a'));
        assert!(assembled.context.contains('b'));
        assert!(!assembled.context.contains('c'));
    }

    #[test]
    fn test_oversize_first_chunk_is_truncated_not_dropped() {
        let results = vec![scored(&"x".repeat(500), "https://kenyalaw.org/1", "One", 0.9)];

        let assembled = assemble(&results, 100, 10);
        assert_eq!(assembled.context.chars().count(), 100);
        assert!(!assembled.context.is_empty());
    }

    #[test]
    fn test_never_empty_when_results_exist() {
        let results = vec![scored("short passage", "https://kenyalaw.org/1", "One", 0.5)];
        let assembled = assemble(&results, 4000, 10);
        assert_eq!(assembled.context, "short passage");
    }

    #[test]
    fn test_empty_results_give_empty_context() {
        let assembled = assemble(&[], 4000, 10);
        assert!(assembled.context.is_empty());
        assert!(assembled.sources.is_empty());
    }

    #[test]
    fn test_max_chunks_cap() {
        let results: Vec<ScoredChunk> = (0..5)
            .map(|i| {
                scored(
                    &format!("passage {}", i),
                    &format!("https://kenyalaw.org/{}", i),
                    "T",
                    1.0 - i as f32 * 0.1,
                )
            })
            .collect();

        let assembled = assemble(&results, 10_000, 2);
        assert!(assembled.context.contains("passage 0"));
        assert!(assembled.context.contains("passage 1"));
        assert!(!assembled.context.contains("passage 2"));
    }

    #[test]
    fn test_sources_deduplicated_in_first_encounter_order() {
        let results = vec![
            scored("first", "https://kenyalaw.org/land", "Land Act", 0.9),
            scored("second", "https://kenyalaw.org/land", "Land Act", 0.8),
            scored("third", "https://kenyalaw.org/courts", "Courts", 0.7),
        ];

        let assembled = assemble(&results, 4000, 10);
        assert_eq!(assembled.sources.len(), 2);
        assert_eq!(assembled.sources[0].title, "Land Act");
        assert_eq!(assembled.sources[1].title, "Courts");
    }

    #[test]
    fn test_same_url_different_title_kept_separately() {
        // Deduplication compares the exact (url, title) pair.
        let results = vec![
            scored("a", "https://kenyalaw.org/land", "Land Act", 0.9),
            scored("b", "https://kenyalaw.org/land", "Land Act (2012)", 0.8),
        ];

        let assembled = assemble(&results, 4000, 10);
        assert_eq!(assembled.sources.len(), 2);
    }
}
