//! Estonian collation for client-side title sorting.
//!
//! The search index cannot be trusted to order distinct result sets by a
//! secondary field, so the works listing re-sorts titles itself. Estonian
//! alphabet order differs from code-point order in ways that matter for
//! early-modern bibliography: š sorts after s, ž after z, z itself between
//! s and t, and õ ä ö ü form their own block between w and x.

/// Estonian alphabet, in collation order.
const ALPHABET: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 'š', 'z', 'ž', 't', 'u', 'v', 'w', 'õ', 'ä', 'ö', 'ü', 'x', 'y',
];

fn rank(c: char) -> u32 {
    let lower = c.to_lowercase().next().unwrap_or(c);
    match ALPHABET.iter().position(|&a| a == lower) {
        Some(i) => i as u32,
        // Anything outside the alphabet (digits, punctuation, foreign
        // letters) sorts after it, by code point.
        None => ALPHABET.len() as u32 + lower as u32,
    }
}

/// Sort key for a title under Estonian alphabet order; case-insensitive.
pub fn collation_key(s: &str) -> Vec<u32> {
    s.chars().map(rank).collect()
}

/// Three-way comparison of two titles under Estonian alphabet order.
pub fn compare(a: &str, b: &str) -> std::cmp::Ordering {
    collation_key(a).cmp(&collation_key(b))
}
