//! Hasher used for shape signatures.
//!
//! Signatures are only compared within one build. Anything that outlives the
//! process should be keyed by explicit ids instead.

#[cfg(feature = "std-hash")]
pub mod default {
    pub use std::collections::hash_map::DefaultHasher;

    #[inline]
    pub fn new() -> DefaultHasher {
        DefaultHasher::new()
    }
}

#[cfg(not(feature = "std-hash"))]
pub mod default {
    pub use ahash::AHasher as DefaultHasher;

    /// Fixed keys, so equal input hashes equally across adapters.
    #[inline]
    pub fn new() -> DefaultHasher {
        DefaultHasher::default()
    }
}

use std::hash::Hasher;

/// Runs `feed` against a fresh default hasher and returns the digest.
pub fn digest<F>(feed: F) -> u64
where
    F: FnOnce(&mut default::DefaultHasher),
{
    let mut hasher = default::new();
    feed(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::Hash;

    #[test]
    fn equal_input_gives_equal_digest() {
        let a = digest(|hasher| ("card", 2usize).hash(hasher));
        let b = digest(|hasher| ("card", 2usize).hash(hasher));
        let c = digest(|hasher| ("card", 3usize).hash(hasher));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
