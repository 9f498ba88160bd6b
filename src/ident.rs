//! Task identifiers.
//!
//! Identifiers are short lowercase alphanumeric strings whose length encodes
//! the task's lifecycle state: 3 characters while active, 6 once completed
//! and 5 once cancelled. Completing or cancelling appends a random suffix to
//! the active id; reopening truncates back to the 3-character prefix.

use rand::Rng;

use crate::error::{Error, Result};
use crate::fields::Lifecycle;

/// Characters an identifier may contain.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Attempts at finding an unused identifier before giving up.
pub const MAX_ATTEMPTS: usize = 10_000;

/// Source of random identifier fragments.
pub trait IdSource {
    /// Return `len` characters drawn from [`ALPHABET`].
    fn fragment(&mut self, len: usize) -> String;
}

/// Thread-local RNG backed source used outside tests.
#[derive(Debug, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn fragment(&mut self, len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

/// Lowercase and trim user-typed identifiers.
pub fn normalise(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Check that `id` only uses identifier characters and decode its state.
pub fn decode(id: &str) -> std::result::Result<Lifecycle, String> {
    if id.is_empty() || !id.bytes().all(|b| ALPHABET.contains(&b)) {
        return Err(format!("identifier '{id}' must be lowercase alphanumeric"));
    }
    Lifecycle::from_id_len(id.len())
        .ok_or_else(|| format!("identifier '{id}' has unrecognised length {}", id.len()))
}

/// Generate ids of the form `prefix + fragment(len)` until `taken` rejects none.
pub fn fresh<F>(ids: &mut dyn IdSource, prefix: &str, len: usize, taken: F) -> Result<String>
where
    F: Fn(&str) -> bool,
{
    for _ in 0..MAX_ATTEMPTS {
        let candidate = format!("{prefix}{}", ids.fragment(len));
        if !taken(&candidate) {
            return Ok(candidate);
        }
    }
    Err(Error::IdsExhausted(prefix.len() + len))
}

/// The 3-character active prefix of any identifier.
pub fn active_prefix(id: &str) -> &str {
    let n = Lifecycle::Active.id_len().min(id.len());
    &id[..n]
}
