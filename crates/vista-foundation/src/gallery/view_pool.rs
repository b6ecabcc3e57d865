//! Bounded pool of released view holders.
//!
//! Holders are keyed by [`ViewType`] and handed back most-recently-released
//! first, skipping holders built for another shape. A release that would
//! overflow its slot destroys the view instead.

use std::cell::RefCell;
use std::rc::Rc;

use vista_core::collections::map::{HashMap, HashSet};

use super::comparator::ShapeSignature;
use super::error::PoolIntegrityError;
use super::toolkit::{ViewId, ViewToolkit, ViewType};
use super::view_holder::ViewHolder;

/// Default number of holders kept per view type.
/// Matches RecyclerView's default cache size.
pub const DEFAULT_POOL_CAPACITY: usize = 7;

/// Policy for pooling released holders.
#[derive(Clone, Debug)]
pub struct PoolPolicy {
    /// Maximum number of holders kept for each view type.
    pub max_per_type: usize,

    /// Whether pooling is enabled.
    pub enabled: bool,

    /// Panic on integrity errors instead of logging them.
    pub strict_integrity: bool,

    overrides: HashMap<ViewType, usize>,
}

impl Default for PoolPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl PoolPolicy {
    /// Creates a policy with the specified per-type capacity.
    pub fn new(max_per_type: usize) -> Self {
        Self {
            max_per_type,
            enabled: true,
            strict_integrity: cfg!(debug_assertions),
            overrides: HashMap::default(),
        }
    }

    /// Disables pooling; every release destroys the view.
    pub fn disabled() -> Self {
        Self {
            max_per_type: 0,
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_capacity_for(mut self, view_type: impl Into<ViewType>, capacity: usize) -> Self {
        self.overrides.insert(view_type.into(), capacity);
        self
    }

    pub fn with_strict_integrity(mut self, strict: bool) -> Self {
        self.strict_integrity = strict;
        self
    }

    pub fn capacity_for(&self, view_type: &ViewType) -> usize {
        if !self.enabled {
            return 0;
        }
        self.overrides
            .get(view_type)
            .copied()
            .unwrap_or(self.max_per_type)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Pooled,
    Disposed,
}

#[derive(Default)]
pub struct ViewPool {
    /// Released holders grouped by view type, most recent last.
    available: HashMap<ViewType, Vec<ViewHolder>>,
    pooled_ids: HashSet<ViewId>,
    policy: PoolPolicy,
    /// Holders rejected by `acquire`, waiting for a toolkit to destroy them.
    quarantine: Vec<ViewHolder>,
    disposed_count: usize,
}

pub type SharedViewPool = Rc<RefCell<ViewPool>>;

impl ViewPool {
    pub fn new() -> Self {
        Self::with_policy(PoolPolicy::default())
    }

    pub fn with_policy(policy: PoolPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn shared(policy: PoolPolicy) -> SharedViewPool {
        Rc::new(RefCell::new(Self::with_policy(policy)))
    }

    pub fn policy(&self) -> &PoolPolicy {
        &self.policy
    }

    /// Takes the most recently released holder of `view_type` that was
    /// built for `shape`.
    ///
    /// A holder that is somehow still bound is unbound, quarantined and
    /// reported instead of being handed out.
    pub fn acquire(
        &mut self,
        view_type: &ViewType,
        shape: ShapeSignature,
    ) -> Result<Option<ViewHolder>, PoolIntegrityError> {
        if !self.policy.enabled {
            return Ok(None);
        }
        let Some(holders) = self.available.get_mut(view_type) else {
            return Ok(None);
        };
        let Some(position) = holders.iter().rposition(|holder| holder.shape() == shape) else {
            return Ok(None);
        };
        let mut holder = holders.remove(position);
        self.pooled_ids.remove(&holder.id());
        if holder.is_bound() {
            let view = holder.id();
            holder.unbind();
            self.quarantine.push(holder);
            return Err(PoolIntegrityError::AcquiredWhileBound { view });
        }
        log::trace!("reusing view {} of type {}", holder.id(), view_type);
        Ok(Some(holder))
    }

    /// Returns `holder` to its slot, or destroys it when the slot is full.
    pub fn release(
        &mut self,
        holder: ViewHolder,
        toolkit: &mut dyn ViewToolkit,
    ) -> Result<ReleaseOutcome, PoolIntegrityError> {
        let view = holder.id();
        if self.pooled_ids.contains(&view) {
            // The pooled copy keeps the view alive; drop this one.
            return Err(PoolIntegrityError::DoubleRelease { view });
        }
        if holder.is_bound() {
            self.dispose(holder, toolkit);
            return Err(PoolIntegrityError::ReleasedWhileBound { view });
        }

        let capacity = self.policy.capacity_for(holder.view_type());
        if self.available_for(holder.view_type()) >= capacity {
            self.dispose(holder, toolkit);
            return Ok(ReleaseOutcome::Disposed);
        }
        holder.view().view.reset();
        self.available
            .entry(holder.view_type().clone())
            .or_default()
            .push(holder);
        self.pooled_ids.insert(view);
        Ok(ReleaseOutcome::Pooled)
    }

    /// Adds a holder built ahead of time.
    ///
    /// Unlike [`release`](Self::release) the holder is taken as is: its view
    /// is not reset and its binding is only checked once it is acquired.
    pub fn put_recycled(
        &mut self,
        holder: ViewHolder,
        toolkit: &mut dyn ViewToolkit,
    ) -> Result<ReleaseOutcome, PoolIntegrityError> {
        let view = holder.id();
        if self.pooled_ids.contains(&view) {
            return Err(PoolIntegrityError::DoubleRelease { view });
        }
        let capacity = self.policy.capacity_for(holder.view_type());
        if self.available_for(holder.view_type()) >= capacity {
            self.dispose(holder, toolkit);
            return Ok(ReleaseOutcome::Disposed);
        }
        self.available
            .entry(holder.view_type().clone())
            .or_default()
            .push(holder);
        self.pooled_ids.insert(view);
        Ok(ReleaseOutcome::Pooled)
    }

    /// Destroys the holder's view right away.
    pub fn dispose(&mut self, holder: ViewHolder, toolkit: &mut dyn ViewToolkit) {
        let view = holder.into_view();
        log::trace!("disposing view {} of type {}", view.id, view.view_type);
        toolkit.destroy_view(view);
        self.disposed_count += 1;
    }

    /// Destroys quarantined holders.
    pub fn drain_quarantine(&mut self, toolkit: &mut dyn ViewToolkit) {
        for holder in std::mem::take(&mut self.quarantine) {
            self.dispose(holder, toolkit);
        }
    }

    /// Destroys every pooled holder.
    pub fn clear(&mut self, toolkit: &mut dyn ViewToolkit) {
        self.pooled_ids.clear();
        let slots = std::mem::take(&mut self.available);
        for holder in slots.into_values().flatten() {
            self.dispose(holder, toolkit);
        }
        self.drain_quarantine(toolkit);
    }

    /// Returns the number of pooled holders.
    pub fn available_count(&self) -> usize {
        self.available.values().map(Vec::len).sum()
    }

    pub fn available_for(&self, view_type: &ViewType) -> usize {
        self.available.get(view_type).map_or(0, Vec::len)
    }

    /// Returns how many views the pool has destroyed so far.
    pub fn disposed_count(&self) -> usize {
        self.disposed_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::decorations::GalleryDecorations;
    use crate::gallery::error::BuildError;
    use crate::gallery::toolkit::{PlatformView, ViewHandle};
    use vista_core::Value;

    struct Inert;

    impl PlatformView for Inert {
        fn set_property(&self, _name: &str, _value: &Value) {}
    }

    #[derive(Default)]
    struct Counter {
        next: u64,
        destroyed: Vec<ViewId>,
    }

    impl ViewToolkit for Counter {
        fn create_view(&mut self, view_type: &ViewType) -> Result<ViewHandle, BuildError> {
            self.next += 1;
            Ok(ViewHandle {
                id: ViewId(self.next),
                view_type: view_type.clone(),
                view: Rc::new(Inert),
            })
        }

        fn destroy_view(&mut self, view: ViewHandle) {
            self.destroyed.push(view.id);
        }

        fn place_view(&mut self, _index: usize, _view: &ViewHandle) {}
        fn remove_view(&mut self, _view: &ViewHandle) {}
        fn place_placeholder(&mut self, _index: usize) {}
        fn clear_placeholder(&mut self, _index: usize) {}
        fn set_scroll_position(&mut self, _index: usize, _offset: i32) {}
        fn apply_decorations(&mut self, _decorations: &GalleryDecorations) {}
    }

    fn holder(toolkit: &mut Counter, view_type: &str) -> ViewHolder {
        shaped(toolkit, view_type, ShapeSignature::default())
    }

    fn shaped(toolkit: &mut Counter, view_type: &str, shape: ShapeSignature) -> ViewHolder {
        ViewHolder::new(
            toolkit.create_view(&ViewType::from(view_type)).unwrap(),
            shape,
        )
    }

    fn any_shape() -> ShapeSignature {
        ShapeSignature::default()
    }

    #[test]
    fn test_capacity_overflow_disposes_and_acquire_is_lifo() {
        let mut toolkit = Counter::default();
        let mut pool = ViewPool::with_policy(PoolPolicy::default().with_capacity_for("card", 2));
        let card = ViewType::from("card");

        let first = holder(&mut toolkit, "card");
        let second = holder(&mut toolkit, "card");
        let third = holder(&mut toolkit, "card");
        let (first_id, second_id, third_id) = (first.id(), second.id(), third.id());

        assert_eq!(pool.release(first, &mut toolkit), Ok(ReleaseOutcome::Pooled));
        assert_eq!(pool.release(second, &mut toolkit), Ok(ReleaseOutcome::Pooled));
        assert_eq!(pool.release(third, &mut toolkit), Ok(ReleaseOutcome::Disposed));
        assert_eq!(toolkit.destroyed, vec![third_id]);
        assert_eq!(pool.available_for(&card), 2);

        let mut next = || pool.acquire(&card, any_shape()).unwrap().map(|h| h.id());
        assert_eq!(next(), Some(second_id));
        assert_eq!(next(), Some(first_id));
        assert_eq!(next(), None);
    }

    #[test]
    fn test_types_do_not_mix() {
        let mut toolkit = Counter::default();
        let mut pool = ViewPool::new();
        let text = holder(&mut toolkit, "text");
        pool.release(text, &mut toolkit).unwrap();

        assert!(pool
            .acquire(&ViewType::from("image"), any_shape())
            .unwrap()
            .is_none());
        assert!(pool
            .acquire(&ViewType::from("text"), any_shape())
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_shapes_do_not_mix() {
        let mut toolkit = Counter::default();
        let mut pool = ViewPool::new();
        let card = ViewType::from("card");
        let (narrow, wide) = (ShapeSignature::from(1), ShapeSignature::from(2));
        let narrow_holder = shaped(&mut toolkit, "card", narrow);
        let wide_holder = shaped(&mut toolkit, "card", wide);
        let narrow_id = narrow_holder.id();
        pool.release(narrow_holder, &mut toolkit).unwrap();
        pool.release(wide_holder, &mut toolkit).unwrap();

        // The wide holder is newer but built for another shape.
        let reused = pool.acquire(&card, narrow).unwrap().map(|h| h.id());
        assert_eq!(reused, Some(narrow_id));
        assert!(pool.acquire(&card, narrow).unwrap().is_none());
        assert_eq!(pool.available_for(&card), 1);
    }

    #[test]
    fn test_put_recycled_holder_is_acquirable() {
        let mut toolkit = Counter::default();
        let mut pool = ViewPool::new();
        let planted = holder(&mut toolkit, "text");
        let id = planted.id();
        assert_eq!(pool.put_recycled(planted, &mut toolkit), Ok(ReleaseOutcome::Pooled));
        assert_eq!(
            pool.acquire(&ViewType::from("text"), any_shape())
                .unwrap()
                .map(|h| h.id()),
            Some(id)
        );
    }

    #[test]
    fn test_double_release_is_reported() {
        let mut toolkit = Counter::default();
        let mut pool = ViewPool::new();
        let original = holder(&mut toolkit, "text");
        let alias = ViewHolder::new(original.view().clone(), original.shape());
        let id = original.id();

        pool.release(original, &mut toolkit).unwrap();
        assert_eq!(
            pool.release(alias, &mut toolkit),
            Err(PoolIntegrityError::DoubleRelease { view: id })
        );
        assert_eq!(pool.available_count(), 1);
        assert!(toolkit.destroyed.is_empty());
    }

    #[test]
    fn test_disabled_pool_disposes_everything() {
        let mut toolkit = Counter::default();
        let mut pool = ViewPool::with_policy(PoolPolicy::disabled());
        let text = holder(&mut toolkit, "text");
        assert_eq!(pool.release(text, &mut toolkit), Ok(ReleaseOutcome::Disposed));
        assert_eq!(pool.available_count(), 0);
        assert_eq!(pool.disposed_count(), 1);
    }

    #[test]
    fn test_clear_destroys_pooled_views() {
        let mut toolkit = Counter::default();
        let mut pool = ViewPool::new();
        for view_type in ["text", "text", "image"] {
            let holder = holder(&mut toolkit, view_type);
            pool.release(holder, &mut toolkit).unwrap();
        }
        pool.clear(&mut toolkit);
        assert_eq!(pool.available_count(), 0);
        assert_eq!(toolkit.destroyed.len(), 3);
    }
}
