//! Keyword-scored retrieval over a tenant's knowledge base.
//!
//! Scoring is purely lexical so results are reproducible: the same query over
//! the same snapshot and language always yields the same ordered list.

use crate::domain::foundation::Language;
use crate::domain::tenant::KnowledgeEntry;

/// Default number of snippets returned.
pub const DEFAULT_LIMIT: usize = 3;

const KEYWORD_WEIGHT: u32 = 2;
const TITLE_WORD_WEIGHT: u32 = 1;
const MIN_TITLE_WORD_LEN: usize = 4;

/// A knowledge entry that matched a query, with its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedSnippet {
    pub entry: KnowledgeEntry,
    pub score: u32,
}

impl RetrievedSnippet {
    /// Formats the snippet for injection into a reply or prompt.
    pub fn render(&self) -> String {
        format!("{}: {}", self.entry.title, self.entry.content)
    }
}

/// Ranks knowledge entries against free-text queries.
///
/// Borrows the tenant's snapshot for the duration of a call; it holds no
/// state of its own.
#[derive(Debug, Clone, Copy)]
pub struct KnowledgeRetriever<'a> {
    entries: &'a [KnowledgeEntry],
}

impl<'a> KnowledgeRetriever<'a> {
    pub fn new(entries: &'a [KnowledgeEntry]) -> Self {
        Self { entries }
    }

    /// Returns at most `limit` entries in `language` that share vocabulary
    /// with `query`, best first.
    ///
    /// Order is `(score desc, priority desc)`; equal pairs keep insertion order.
    pub fn retrieve(&self, query: &str, language: &Language, limit: usize) -> Vec<RetrievedSnippet> {
        let query = query.to_lowercase();
        if query.trim().is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<RetrievedSnippet> = self
            .entries
            .iter()
            .filter(|entry| entry.language == *language)
            .filter_map(|entry| {
                let score = score_entry(&query, entry);
                (score > 0).then(|| RetrievedSnippet {
                    entry: entry.clone(),
                    score,
                })
            })
            .collect();

        // sort_by is stable, so insertion order survives full ties.
        scored.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.entry.priority.cmp(&a.entry.priority))
        });
        scored.truncate(limit);
        scored
    }

    /// Best single match, if any.
    pub fn top(&self, query: &str, language: &Language) -> Option<RetrievedSnippet> {
        self.retrieve(query, language, 1).into_iter().next()
    }
}

/// `query` must already be lowercased.
fn score_entry(query: &str, entry: &KnowledgeEntry) -> u32 {
    let keyword_hits = entry
        .keywords
        .iter()
        .filter(|kw| !kw.is_empty() && query.contains(kw.to_lowercase().as_str()))
        .count() as u32;

    let title_hits = entry
        .title
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|word| word.chars().count() >= MIN_TITLE_WORD_LEN && query.contains(word.as_str()))
        .count() as u32;

    KEYWORD_WEIGHT * keyword_hits + TITLE_WORD_WEIGHT * title_hits
}
