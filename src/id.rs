//! Session-scoped id generation.
//!
//! Ids are random base-36 strings. They only need to be unique among the
//! live nodes and connections of one editor session, so callers pass a
//! predicate that reports ids already in use and generation retries until
//! it finds a free one.

#[cfg(test)]
#[path = "id_test.rs"]
mod id_test;

use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Number of random base-36 digits in a generated id (~46 bits).
pub const ID_RANDOM_LEN: usize = 9;

/// A random base-36 string of [`ID_RANDOM_LEN`] characters.
#[must_use]
pub fn random_base36() -> String {
    let mut rng = rand::rng();
    (0..ID_RANDOM_LEN)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}

/// Generate `"{prefix}-{random}"`, retrying while `taken` reports a collision.
pub fn fresh_id<F>(prefix: &str, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    loop {
        let candidate = format!("{prefix}-{}", random_base36());
        if !taken(&candidate) {
            return candidate;
        }
    }
}
