//! Test doubles and harness for Vista galleries.

mod test_binder;
mod test_resolver;
mod test_rule;
mod test_toolkit;

pub use test_binder::*;
pub use test_resolver::*;
pub use test_rule::*;
pub use test_toolkit::*;
