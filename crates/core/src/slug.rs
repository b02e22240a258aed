//! Session slug generation.
//!
//! Slugs are short `[a-z0-9]` strings used in audience links. They are
//! globally unique and never reused, so the caller supplies a claim function
//! that atomically reserves a candidate against every slug ever issued.

use rand::Rng;

use crate::error::CoreError;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of a freshly generated slug.
pub const SLUG_LENGTH: usize = 6;

/// Length used once the short space keeps colliding.
pub const FALLBACK_SLUG_LENGTH: usize = 8;

/// Attempts per length before giving up on it.
pub const MAX_TRIES: usize = 10;

/// Random slug of `len` characters.
pub fn random_slug(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Generate a slug and reserve it with `try_claim`.
///
/// `try_claim` returns `true` when the candidate was unused and is now
/// reserved. Tries [`MAX_TRIES`] short slugs, then [`MAX_TRIES`] long ones.
pub fn generate_unique<F>(mut try_claim: F) -> Result<String, CoreError>
where
    F: FnMut(&str) -> bool,
{
    for len in [SLUG_LENGTH, FALLBACK_SLUG_LENGTH] {
        for _ in 0..MAX_TRIES {
            let candidate = random_slug(len);
            if try_claim(&candidate) {
                return Ok(candidate);
            }
        }
    }
    Err(CoreError::Internal("Failed to generate unique slug".into()))
}

/// Whether `s` has the shape of an issued slug.
pub fn is_valid_slug(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| ALPHABET.contains(&b))
}
