//! Core types for the Vista gallery engine.
//!
//! This crate holds what every other Vista crate agrees on: resolved
//! [`Value`]s, data-bound [`Expression`]s, the [`ExpressionResolver`]
//! interface to the external expression engine, and subscription ownership.

pub mod collections;
pub mod error;
pub mod expression;
pub mod hash;
pub mod subscription;
pub mod value;

pub use error::ResolutionError;
pub use expression::{
    Expression, ExpressionResolver, ResolverId, ResolverRef, SubscriptionHandle,
};
pub use subscription::{Subscription, SubscriptionScope};
pub use value::Value;
