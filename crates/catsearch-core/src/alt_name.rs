//! Alternate-name derivation.
//!
//! The engine never corrects a typo in a word's first character. Indexing a
//! second copy of every name with the first character of each long token
//! removed, and applying the same transform to the query, turns such a typo
//! into an exact match on that copy.

/// Tokens shorter than this pass through unchanged.
pub const MIN_STRIPPED_TOKEN_LEN: usize = 3;

/// Lower-case, split on Unicode whitespace, drop the first character of every
/// token of three or more characters, rejoin with single spaces.
///
/// Used identically on catalog names at index time and on queries at search time.
pub fn alternate_name(input: &str) -> String {
    input.to_lowercase().split_whitespace().map(strip_token).collect::<Vec<_>>().join(" ")
}

/// Query-side form of [`alternate_name`]: `None` when no token was long enough
/// to strip, since searching the result would repeat the direct query.
pub fn alternate_query(query: &str) -> Option<String> {
    let lowered = query.to_lowercase();
    let mut stripped = false;
    let tokens: Vec<&str> = lowered
        .split_whitespace()
        .map(|token| {
            let out = strip_token(token);
            stripped |= out.len() != token.len();
            out
        })
        .collect();
    if !stripped {
        return None;
    }
    Some(tokens.join(" "))
}

fn strip_token(token: &str) -> &str {
    let mut chars = token.chars();
    if chars.clone().count() < MIN_STRIPPED_TOKEN_LEN {
        return token;
    }
    chars.next();
    chars.as_str()
}
