//! Map aliases shared by every Vista crate.
//!
//! The `std-hash` feature swaps the Fx maps for the std ones, which is handy
//! when chasing iteration-order dependent bugs.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
}
