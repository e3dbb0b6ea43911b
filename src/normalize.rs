//! Whitespace normalization for extracted cell text.

/// Collapse line breaks and whitespace runs into single spaces and trim both ends.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
