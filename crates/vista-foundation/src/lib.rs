//! Gallery reconciliation and view recycling for Vista.
//!
//! See [`gallery`] for the architecture.

pub mod gallery;

pub use gallery::*;
