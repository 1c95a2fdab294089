//! Fuzzy name resolution.
//!
//! Users type "brandon sandersen" and mean Brandon Sanderson. Catalog
//! lookups go through a normalized-Levenshtein match so close-enough names
//! resolve and distant ones fall through to a "not found" reply.

/// Levenshtein edit distance between two strings, by character.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalized similarity in [0, 1]: 1.0 = identical (ignoring case and
/// surrounding whitespace), 0.0 = nothing in common.
pub fn similarity(a: &str, b: &str) -> f32 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    let dist = levenshtein(&a, &b);
    1.0 - (dist as f32 / max_len as f32)
}

/// Find the candidate most similar to `needle`, if any clears `min_score`.
///
/// Returns the matched candidate (its canonical spelling) and the score.
pub fn best_match<'a>(
    needle: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    min_score: f32,
) -> Option<(&'a str, f32)> {
    let mut best: Option<(&'a str, f32)> = None;

    for candidate in candidates {
        let score = similarity(needle, candidate);
        if score >= min_score && best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }

    best
}
