//! Free-text query resolution.
//!
//! A raw query string resolves to one of three modes before touching the
//! store: a literal id shortcut (all digits, at most five of them), a
//! blank no-op that leaves the base set untouched, or a ranked full-text
//! match over title and description.

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Marker wrapped around matched terms in highlighted excerpts.
pub const HIGHLIGHT_OPEN: &str = "<span class=\"hl\">";
pub const HIGHLIGHT_CLOSE: &str = "</span>";

const ID_SHORTCUT_MAX_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Blank input: no search, the caller keeps the full base set.
    All,
    /// Digits-only shortcut: look the task up by id, bypassing ranking.
    IdLookup(i64),
    /// Ranked full-text match; holds the sanitised FTS expression.
    Text(String),
}

impl SearchQuery {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return SearchQuery::All;
        }
        if trimmed.len() <= ID_SHORTCUT_MAX_LEN
            && trimmed.bytes().all(|b| b.is_ascii_digit())
        {
            // Five ASCII digits always fit in an i64.
            if let Ok(id) = trimmed.parse::<i64>() {
                return SearchQuery::IdLookup(id);
            }
        }
        SearchQuery::Text(fts_match_expr(trimmed))
    }
}

/// Build a safe FTS5 MATCH expression from user text: every whitespace
/// token is double-quoted (embedded quotes doubled) and tokens are joined
/// with implicit AND. Keeps operators like `OR` or `*` from reaching the
/// FTS parser.
pub fn fts_match_expr(input: &str) -> String {
    input
        .split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One ranked search result. `rank` is the negated bm25 score, so higher
/// means more relevant; the id-shortcut path reports rank 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub task: Task,
    pub rank: f64,
    pub title_excerpt: Option<String>,
    pub body_excerpt: Option<String>,
}

impl SearchHit {
    pub fn unranked(task: Task) -> Self {
        Self {
            task,
            rank: 0.0,
            title_excerpt: None,
            body_excerpt: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_is_noop() {
        assert_eq!(SearchQuery::parse(""), SearchQuery::All);
        assert_eq!(SearchQuery::parse("   \t "), SearchQuery::All);
    }

    #[test]
    fn short_digit_strings_become_id_lookups() {
        assert_eq!(SearchQuery::parse("42"), SearchQuery::IdLookup(42));
        assert_eq!(SearchQuery::parse(" 99999 "), SearchQuery::IdLookup(99999));
    }

    #[test]
    fn six_digits_fall_through_to_text() {
        match SearchQuery::parse("123456") {
            SearchQuery::Text(expr) => assert_eq!(expr, "\"123456\""),
            other => panic!("expected text query, got {other:?}"),
        }
    }

    #[test]
    fn mixed_input_is_text() {
        match SearchQuery::parse("42nd street") {
            SearchQuery::Text(expr) => assert_eq!(expr, "\"42nd\" \"street\""),
            other => panic!("expected text query, got {other:?}"),
        }
    }

    #[test]
    fn fts_expr_quotes_tokens() {
        assert_eq!(fts_match_expr("urgent fix"), "\"urgent\" \"fix\"");
        // Operators and wildcards are neutralised by quoting.
        assert_eq!(fts_match_expr("a OR b"), "\"a\" \"OR\" \"b\"");
        assert_eq!(fts_match_expr("pre*"), "\"pre*\"");
        // Embedded quotes are doubled.
        assert_eq!(fts_match_expr("say \"hi\""), "\"say\" \"\"\"hi\"\"\"");
    }
}
