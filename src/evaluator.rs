//! Answer evaluation: exact city match modulo case.

/// True when `submitted` names the canonical city. No trimming, no fuzzy matching.
pub fn is_correct(submitted: &str, canonical: &str) -> bool {
  submitted.chars().flat_map(char::to_lowercase).eq(canonical.chars().flat_map(char::to_lowercase))
}
