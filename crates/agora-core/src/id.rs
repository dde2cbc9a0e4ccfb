//! Content-derived identifier generation.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Length of keyed ids: the leading hex characters kept from the digest.
const KEYED_ID_LEN: usize = 24;

/// Deterministic identifier source.
///
/// Content ids are version-5 UUIDs keyed by a namespace drawn once per
/// generator, so identical content maps to the identical id for the lifetime
/// of the instance. Construct with [`IdGenerator::with_namespace`] when ids
/// must be byte-stable across restarts.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    namespace: Uuid,
}

impl IdGenerator {
    /// Generator with a fresh random namespace.
    pub fn new() -> Self {
        Self {
            namespace: Uuid::new_v4(),
        }
    }

    /// Generator with a fixed namespace.
    pub fn with_namespace(namespace: Uuid) -> Self {
        Self { namespace }
    }

    /// Derive an id from the concatenated, space-trimmed content parts.
    pub fn content_id(&self, parts: &[&str]) -> String {
        let data = parts.concat();
        let data = data.trim_matches(' ');
        Uuid::new_v5(&self.namespace, data.as_bytes()).to_string()
    }

    /// Derive a short id from a digest of `seed`, used for user identifiers
    /// keyed by username.
    pub fn keyed_id(&self, seed: &str) -> String {
        let mut digest = hex::encode(Sha256::digest(seed.as_bytes()));
        digest.truncate(KEYED_ID_LEN);
        digest
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_is_stable_within_one_generator() {
        let ids = IdGenerator::new();

        let a = ids.content_id(&["a", "b", "c"]);
        let b = ids.content_id(&["a", "b", "c"]);
        assert_eq!(a, b);
    }

    #[test]
    fn content_id_differs_for_different_input() {
        let ids = IdGenerator::new();

        assert_ne!(ids.content_id(&["a", "b", "c"]), ids.content_id(&["a", "b"]));
    }

    #[test]
    fn content_id_trims_outer_spaces() {
        let ids = IdGenerator::new();

        assert_eq!(ids.content_id(&[" title", "author "]), ids.content_id(&["title", "author"]));
    }

    #[test]
    fn content_id_depends_on_the_namespace() {
        let input = ["a", "b", "c"];

        assert_ne!(
            IdGenerator::new().content_id(&input),
            IdGenerator::new().content_id(&input)
        );
    }

    #[test]
    fn fixed_namespace_reproduces_ids() {
        let namespace = Uuid::new_v4();
        let input = ["a", "b", "c"];

        assert_eq!(
            IdGenerator::with_namespace(namespace).content_id(&input),
            IdGenerator::with_namespace(namespace).content_id(&input)
        );
    }

    #[test]
    fn keyed_id_is_deterministic_and_short() {
        let ids = IdGenerator::new();

        let id = ids.keyed_id("gopher");
        assert_eq!(id.len(), KEYED_ID_LEN);
        assert_eq!(id, ids.keyed_id("gopher"));
        assert_ne!(id, ids.keyed_id("ferris"));
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
