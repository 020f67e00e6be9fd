//! Text normalization for rule evaluation.
//!
//! The normalized form is only ever used to test heuristics; the text sent
//! to the model is never normalized.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Portuguese function words dropped before rule matching.
static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "o", "os", "as", "um", "uma", "uns", "umas", //
        "de", "do", "da", "dos", "das", "em", "no", "na", "nos", "nas", //
        "para", "por", "com", "sem", "sobre", "entre", //
        "e", "ou", "mas", "que", "se", "isso", "essa", "esse", "esta", "este", //
        "eu", "você", "vc", "vocês", "nós", "me", "minha", "meu",
    ]
    .into_iter()
    .collect()
});

/// Anything that is not a word character (Unicode letters, accented
/// included, digits, underscore) or whitespace.
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Lowercase, strip punctuation, collapse whitespace and drop stopwords.
///
/// Total and deterministic: empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let collapsed = WHITESPACE_RUN.replace_all(&lowered, " ");
    let stripped = NON_WORD.replace_all(&collapsed, " ");

    stripped
        .split_whitespace()
        .filter(|token| !is_stopword(token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}
