//! Tokenization, relevance scoring, and snippet generation

use crate::store::{SearchHit, StoredPage};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Splits text into lowercase alphanumeric terms
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(|term| term.to_lowercase())
        .collect()
}

/// Counts term occurrences in a text
pub fn token_counts(text: &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

/// Term-frequency relevance of a page against pre-tokenized query terms
///
/// The score is the summed frequency of the query terms, normalized by the
/// page's token total so long pages gain no automatic advantage.
pub fn relevance(page: &StoredPage, query_tokens: &[String]) -> f32 {
    if page.token_total == 0 {
        return 0.0;
    }

    let matched: u32 = query_tokens
        .iter()
        .filter_map(|token| page.tokens.get(token))
        .sum();

    matched as f32 / page.token_total as f32
}

/// Ranks pages against a query
///
/// Zero-relevance pages are dropped. Ordering is descending score, then
/// ascending fetch timestamp, then URL, so equal inputs always produce the
/// same result sequence.
pub fn rank_pages(
    pages: impl IntoIterator<Item = StoredPage>,
    query: &str,
    limit: usize,
) -> Vec<SearchHit> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = pages
        .into_iter()
        .filter_map(|page| {
            let score = relevance(&page, &query_tokens);
            if score > 0.0 {
                Some(SearchHit { page, score })
            } else {
                None
            }
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.page.document.fetched_at.cmp(&b.page.document.fetched_at))
            .then_with(|| a.page.document.url.as_str().cmp(b.page.document.url.as_str()))
    });

    hits.truncate(limit);
    hits
}

/// Builds a short excerpt around the first query-term match
///
/// Falls back to the head of the text when no term matches.
pub fn make_snippet(text: &str, query: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let query_tokens = tokenize(query);

    let match_pos = query_tokens
        .iter()
        .filter_map(|token| find_term(&chars, token))
        .min();

    let (start, end) = match match_pos {
        Some(pos) => {
            let start = pos.saturating_sub(max_chars / 3);
            (start, (start + max_chars).min(chars.len()))
        }
        None => (0, max_chars.min(chars.len())),
    };

    let mut snippet: String = chars[start..end].iter().collect();
    if start > 0 {
        snippet = format!("...{}", snippet.trim_start());
    }
    if end < chars.len() {
        snippet = format!("{}...", snippet.trim_end());
    }

    snippet
}

/// Case-insensitive position of a term within a char sequence
fn find_term(chars: &[char], term: &str) -> Option<usize> {
    let term_chars: Vec<char> = term.chars().collect();
    if term_chars.is_empty() || term_chars.len() > chars.len() {
        return None;
    }

    chars.windows(term_chars.len()).position(|window| {
        window
            .iter()
            .zip(&term_chars)
            .all(|(c, t)| c.to_lowercase().next().unwrap_or(*c) == *t)
    })
}
