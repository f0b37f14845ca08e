//! Compound-split candidate generation for queries typed without spaces.

/// Both halves of a split keep at least this many characters.
pub const MIN_SPLIT_PART: usize = 4;

/// Tokens shorter than this produce no candidates.
pub const MIN_SPLIT_TOKEN: usize = 2 * MIN_SPLIT_PART;

/// Every candidate query obtained by splitting one whitespace token of
/// [`MIN_SPLIT_TOKEN`]+ characters in two, other tokens unchanged.
///
/// Order: tokens left to right, and within a token the shortest prefix first.
/// Positions count characters, not bytes.
pub fn split_candidates(query: &str) -> Vec<String> {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    let mut candidates = Vec::new();
    for (pos, token) in tokens.iter().enumerate() {
        let boundaries: Vec<usize> = token.char_indices().map(|(i, _)| i).collect();
        let len = boundaries.len();
        if len < MIN_SPLIT_TOKEN {
            continue;
        }
        for at in MIN_SPLIT_PART..=len - MIN_SPLIT_PART {
            let (head, tail) = token.split_at(boundaries[at]);
            let mut parts: Vec<&str> = Vec::with_capacity(tokens.len() + 1);
            parts.extend_from_slice(&tokens[..pos]);
            parts.push(head);
            parts.push(tail);
            parts.extend_from_slice(&tokens[pos + 1..]);
            candidates.push(parts.join(" "));
        }
    }
    candidates
}
