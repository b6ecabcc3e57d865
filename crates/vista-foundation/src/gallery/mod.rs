//! Data-bound gallery engine.
//!
//! Keeps a virtualized collection of platform views in sync with a
//! declarative, expression-driven item source without tearing the view tree
//! down on every variable change.
//!
//! # Architecture
//!
//! Leaves first:
//! - [`resolve_items`] - turns an [`ItemSource`] into an [`ItemSequence`]
//! - [`is_replaceable`] - structural comparison of two descriptor trees
//! - [`ViewPool`] - bounded, type-keyed LIFO pool of released [`ViewHolder`]s
//! - [`diff`] - keyed edit script between two item sequences
//! - [`GalleryAdapter`] - owns the sequence and slots, applies patches
//! - [`ScrollStateStore`] - per-collection scroll position records
//!
//! Subscription callbacks never touch the adapter directly. They raise a
//! [`RebindSignal`], and the host calls [`GalleryAdapter::flush`] from its
//! event loop, which drains the signal with latest-wins coalescing.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut adapter = GalleryAdapter::new(PropertyBinder, toolkit, pool, store);
//! adapter.bind(Rc::new(gallery), context)?;
//! // later, from the host loop
//! adapter.flush()?;
//! ```

mod adapter;
mod binder;
mod collection;
mod comparator;
mod decorations;
mod descriptor;
mod error;
mod item_source;
mod patch;
mod rebind;
mod scroll_state;
mod settle;
mod toolkit;
mod view_holder;
mod view_pool;

pub use adapter::*;
pub use binder::*;
pub use collection::*;
pub use comparator::*;
pub use decorations::*;
pub use descriptor::*;
pub use error::*;
pub use item_source::*;
pub use patch::*;
pub use rebind::*;
pub use scroll_state::*;
pub use settle::*;
pub use toolkit::*;
pub use view_holder::*;
pub use view_pool::*;
