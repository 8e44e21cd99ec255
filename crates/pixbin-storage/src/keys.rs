//! Object key generation.
//!
//! Keys are short random strings over a lowercase base-36 alphabet, which
//! keeps them filesystem- and URL-safe. An 8-character key gives ~2.8e12
//! possibilities, so birthday collisions stay negligible at this service's
//! volume; collisions that do happen are caught by the exists-before-put
//! check in the orchestrator.

use rand::Rng;

/// Alphabet for generated keys: lowercase letters and digits.
const KEY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random key of `length` characters.
///
/// Uses the thread-local CSPRNG; callers should not assume uniqueness and
/// must collision-check before writing.
pub fn generate_key(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..KEY_ALPHABET.len());
            KEY_ALPHABET[idx] as char
        })
        .collect()
}

/// Compose the full object key from a generated id and canonical extension.
pub fn object_key(id: &str, extension: &str) -> String {
    format!("{}.{}", id, extension)
}
