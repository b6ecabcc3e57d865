//! Collection adapter: keeps bound views in step with the item sequence.
//!
//! The adapter owns the current [`ItemSequence`] and one slot per item.
//! Slots inside the visible window (plus a margin on each side) hold a bound
//! [`ViewHolder`]; the rest are unbound. New sequences are diffed against the
//! current one and the resulting patch is applied to the slots, so surviving
//! items keep their views.

use std::ops::Range;
use std::rc::Rc;

use vista_core::{ResolverRef, SubscriptionScope};

use super::binder::ItemBinder;
use super::collection::Gallery;
use super::comparator::{KeyedDiffer, SequenceDiffer, ShapeSignature};
use super::decorations::GalleryDecorations;
use super::descriptor::{ItemDescriptor, ItemKey, ItemSequence};
use super::error::{BuildError, GalleryError, PoolIntegrityError};
use super::item_source::{resolve_items, subscribe_source, ItemSource};
use super::patch::PatchOp;
use super::rebind::RebindSignal;
use super::scroll_state::{CollectionId, ScrollPosition, ScrollStateRecord, ScrollStateStore};
use super::toolkit::SharedToolkit;
use super::view_holder::ViewHolder;
use super::view_pool::SharedViewPool;

/// Items bound when the host has not reported a window yet.
pub const DEFAULT_VISIBLE_ITEM_COUNT: usize = 4;

/// Items kept bound on each side of the visible window.
pub const DEFAULT_BEYOND_BOUNDS_ITEM_COUNT: usize = 2;

/// Drain passes before pending work is left for the next flush.
const MAX_DRAIN_PASSES: usize = 8;

#[derive(Clone, Debug, PartialEq)]
pub struct GalleryConfig {
    pub visible_item_count: usize,
    pub beyond_bounds_item_count: usize,
    /// Pixels per dp.
    pub density: f32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            visible_item_count: DEFAULT_VISIBLE_ITEM_COUNT,
            beyond_bounds_item_count: DEFAULT_BEYOND_BOUNDS_ITEM_COUNT,
            density: 1.0,
        }
    }
}

impl GalleryConfig {
    pub fn with_visible_item_count(mut self, count: usize) -> Self {
        self.visible_item_count = count;
        self
    }

    pub fn with_beyond_bounds_item_count(mut self, count: usize) -> Self {
        self.beyond_bounds_item_count = count;
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }
}

/// Statistics about view lifecycle.
///
/// Used for testing and debugging recycling behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdapterStats {
    /// Number of slots currently holding a bound view.
    pub items_in_use: usize,

    /// Number of holders in the shared pool.
    pub items_in_pool: usize,

    /// Total number of views built through the binder.
    pub total_built: usize,

    /// Number of holders taken from the pool instead of being built.
    pub reuse_count: usize,

    /// Number of cheap leaf rebinds of a replaceable item.
    pub rebind_count: usize,

    /// Number of holders discarded because the item changed shape.
    pub rebuild_count: usize,

    /// Number of items that ended up as placeholders.
    pub failed_count: usize,
}

#[derive(Debug)]
pub struct ItemFailure {
    pub index: usize,
    pub key: Option<ItemKey>,
    pub error: BuildError,
}

/// What one adapter call did.
#[derive(Debug, Default)]
pub struct BindReport {
    pub inserted: usize,
    pub removed: usize,
    pub moved: usize,
    pub built: usize,
    pub reused: usize,
    pub rebound: usize,
    pub rebuilt: usize,
    pub failures: Vec<ItemFailure>,
    /// Position read from the store or the default item, when one was read.
    pub restored: Option<ScrollStateRecord>,
}

impl BindReport {
    pub fn merge(&mut self, other: BindReport) {
        self.inserted += other.inserted;
        self.removed += other.removed;
        self.moved += other.moved;
        self.built += other.built;
        self.reused += other.reused;
        self.rebound += other.rebound;
        self.rebuilt += other.rebuilt;
        self.failures.extend(other.failures);
        if other.restored.is_some() {
            self.restored = other.restored;
        }
    }

    pub fn patch_op_count(&self) -> usize {
        self.inserted + self.removed + self.moved
    }

    /// Nothing was patched, built, rebound or rebuilt.
    pub fn is_noop(&self) -> bool {
        self.patch_op_count() == 0
            && self.built + self.reused + self.rebound + self.rebuilt == 0
            && self.failures.is_empty()
    }
}

enum Slot {
    Unbound,
    Bound(ViewHolder),
    /// `placed_at` is where the toolkit currently shows the placeholder; it
    /// lags behind the slot index until the next layout pass.
    Failed {
        item: ItemDescriptor,
        placed_at: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    Unbound,
    Bound,
    /// Rendered as a placeholder after a build error.
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Detach {
    /// Rebind to another gallery; the scroll record stays.
    Transient,
    /// The collection is gone for good; the scroll record is evicted.
    Permanent,
}

struct Attachment {
    gallery: Rc<Gallery>,
    context: ResolverRef,
    collection_id: CollectionId,
    source: ItemSource,
    source_subscriptions: SubscriptionScope,
    decoration_subscriptions: SubscriptionScope,
    decorations: GalleryDecorations,
}

/// Binds a gallery to platform views through an [`ItemBinder`].
///
/// # Example
///
/// ```rust,ignore
/// let mut adapter = GalleryAdapter::new(PropertyBinder, toolkit, pool, store);
/// adapter.bind(Rc::new(gallery), context)?;
/// adapter.set_visible_window(10, 5);
/// adapter.on_scroll_settled(10, 24);
/// adapter.dispose();
/// ```
pub struct GalleryAdapter<B: ItemBinder> {
    binder: B,
    config: GalleryConfig,
    toolkit: SharedToolkit,
    pool: SharedViewPool,
    scroll_store: ScrollStateStore,
    signal: RebindSignal,
    differ: Box<dyn SequenceDiffer>,
    attachment: Option<Attachment>,
    items: ItemSequence,
    slots: Vec<Slot>,
    position: ScrollPosition,
    visible_count: usize,
    pending_source: Option<ItemSource>,
    stats: AdapterStats,
}

impl<B: ItemBinder> GalleryAdapter<B> {
    pub fn new(
        binder: B,
        toolkit: SharedToolkit,
        pool: SharedViewPool,
        scroll_store: ScrollStateStore,
    ) -> Self {
        Self::with_config(binder, toolkit, pool, scroll_store, GalleryConfig::default())
    }

    pub fn with_config(
        binder: B,
        toolkit: SharedToolkit,
        pool: SharedViewPool,
        scroll_store: ScrollStateStore,
        config: GalleryConfig,
    ) -> Self {
        let visible_count = config.visible_item_count;
        Self {
            binder,
            config,
            toolkit,
            pool,
            scroll_store,
            signal: RebindSignal::new(),
            differ: Box::new(KeyedDiffer),
            attachment: None,
            items: ItemSequence::default(),
            slots: Vec::new(),
            position: ScrollPosition::default(),
            visible_count,
            pending_source: None,
            stats: AdapterStats::default(),
        }
    }

    /// Binds `gallery` against `context`.
    ///
    /// Rebinding the gallery that is already bound, against the same
    /// context, patches the items in place and renews subscriptions. Any
    /// other gallery replaces the current one: it is resolved first, so a
    /// resolution error leaves the current collection untouched.
    pub fn bind(
        &mut self,
        gallery: Rc<Gallery>,
        context: ResolverRef,
    ) -> Result<BindReport, GalleryError> {
        if let Some(attachment) = &self.attachment {
            if Rc::ptr_eq(&attachment.gallery, &gallery)
                && attachment.context.id() == context.id()
            {
                let report = self.apply_patch(gallery.source().clone())?;
                self.resubscribe();
                return Ok(report);
            }
        }

        let items = resolve_items(gallery.source(), &context)?;
        let decorations = gallery.params().resolve(&context, self.config.density)?;
        let default_item = gallery.params().default_item_index(&context)?;
        let collection_id = gallery.collection_id();
        let keep_position = self
            .attachment
            .as_ref()
            .is_some_and(|attachment| attachment.collection_id == collection_id)
            && self.position.index < items.len();

        self.teardown(Detach::Transient);

        let restored = if keep_position {
            None
        } else {
            let record = self
                .scroll_store
                .get(&collection_id)
                .unwrap_or(ScrollStateRecord::new(default_item, 0));
            let index = record.index.min(items.len().saturating_sub(1));
            self.position = ScrollPosition::new(index, record.offset);
            Some(record)
        };
        self.position.anchor_key = items
            .get(self.position.index)
            .and_then(|item| item.key().cloned());
        log::debug!(
            "binding gallery {collection_id} with {} items at ({}, {})",
            items.len(),
            self.position.index,
            self.position.offset
        );

        self.signal.reattach();
        {
            let mut toolkit = self.toolkit.borrow_mut();
            toolkit.apply_decorations(&decorations);
            toolkit.set_scroll_position(self.position.index, self.position.offset);
        }
        self.slots = items.iter().map(|_| Slot::Unbound).collect();
        self.items = items;
        self.attachment = Some(Attachment {
            source: gallery.source().clone(),
            gallery,
            context,
            collection_id,
            source_subscriptions: SubscriptionScope::new(),
            decoration_subscriptions: SubscriptionScope::new(),
            decorations,
        });
        self.resubscribe();

        let mut report = BindReport {
            inserted: self.items.len(),
            restored,
            ..BindReport::default()
        };
        self.layout_window(&mut report);
        self.update_stats();
        Ok(report)
    }

    /// Replaces the diff used by later reconciliations.
    pub fn set_differ(&mut self, differ: impl SequenceDiffer + 'static) {
        self.differ = Box::new(differ);
    }

    /// Replaces the item source of the bound gallery and reconciles.
    pub fn apply_patch(&mut self, source: ItemSource) -> Result<BindReport, GalleryError> {
        if self.attachment.is_none() {
            return Err(GalleryError::NotAttached);
        }
        self.pending_source = Some(source);
        self.signal.request_source();
        self.drain()
    }

    /// Processes work raised by subscriptions since the last call.
    pub fn flush(&mut self) -> Result<BindReport, GalleryError> {
        if self.attachment.is_none() {
            return Ok(BindReport::default());
        }
        self.drain()
    }

    /// Layout callback: the host now shows `count` items from `first`.
    pub fn set_visible_window(&mut self, first: usize, count: usize) -> BindReport {
        self.position.index = first;
        self.position.anchor_key = self.items.get(first).and_then(|item| item.key().cloned());
        self.visible_count = count;
        let mut report = BindReport::default();
        self.layout_window(&mut report);
        self.update_stats();
        report
    }

    /// Records a settled scroll position and binds the new window.
    pub fn on_scroll_settled(&mut self, index: usize, offset: i32) -> BindReport {
        self.position.offset = offset;
        if let Some(attachment) = &self.attachment {
            self.scroll_store.save(&attachment.collection_id, index, offset);
        }
        let count = self.visible_count;
        self.set_visible_window(index, count)
    }

    /// Transient detach: views go back to the pool, the scroll record stays.
    pub fn suspend(&mut self) {
        self.teardown(Detach::Transient);
    }

    /// Permanent detach: like [`suspend`](Self::suspend), and the scroll
    /// record of the collection is evicted.
    pub fn dispose(&mut self) {
        self.teardown(Detach::Permanent);
    }

    /// Registers a callback run when subscriptions raise pending work; the
    /// host typically schedules [`flush`](Self::flush) from it.
    pub fn add_invalidate_callback(&self, callback: Rc<dyn Fn()>) -> u64 {
        self.signal.add_invalidate_callback(callback)
    }

    pub fn remove_invalidate_callback(&self, id: u64) {
        self.signal.remove_invalidate_callback(id);
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn has_pending_work(&self) -> bool {
        self.signal.is_pending()
    }

    pub fn binder(&self) -> &B {
        &self.binder
    }

    pub fn stats(&self) -> AdapterStats {
        self.stats
    }

    pub fn items(&self) -> &ItemSequence {
        &self.items
    }

    pub fn scroll_position(&self) -> &ScrollPosition {
        &self.position
    }

    pub fn collection_id(&self) -> Option<&CollectionId> {
        self.attachment.as_ref().map(|attachment| &attachment.collection_id)
    }

    pub fn decorations(&self) -> Option<&GalleryDecorations> {
        self.attachment.as_ref().map(|attachment| &attachment.decorations)
    }

    pub fn slot_state(&self, index: usize) -> Option<SlotState> {
        self.slots.get(index).map(|slot| match slot {
            Slot::Unbound => SlotState::Unbound,
            Slot::Bound(_) => SlotState::Bound,
            Slot::Failed { .. } => SlotState::Failed,
        })
    }

    pub fn bound_holder(&self, index: usize) -> Option<&ViewHolder> {
        match self.slots.get(index) {
            Some(Slot::Bound(holder)) => Some(holder),
            _ => None,
        }
    }

    /// Indices of slots kept bound: the visible window plus the margins.
    pub fn visible_range(&self) -> Range<usize> {
        let len = self.slots.len();
        let beyond = self.config.beyond_bounds_item_count;
        let start = self.position.index.saturating_sub(beyond).min(len);
        let end = self
            .position
            .index
            .saturating_add(self.visible_count)
            .saturating_add(beyond)
            .min(len);
        start..end
    }

    fn drain(&mut self) -> Result<BindReport, GalleryError> {
        let Some(_flight) = self.signal.begin_flight() else {
            return Ok(BindReport::default());
        };
        let mut report = BindReport::default();
        for _ in 0..MAX_DRAIN_PASSES {
            let decorations = self.signal.take_decorations();
            let source = self.signal.take_source();
            if !decorations && !source {
                return Ok(report);
            }
            if decorations {
                if let Err(err) = self.refresh_decorations() {
                    if source {
                        // Keep the source change for the next flush.
                        self.signal.request_source();
                    }
                    return Err(err);
                }
            }
            if source {
                report.merge(self.reconcile()?);
            }
        }
        log::warn!("gallery still dirty after {MAX_DRAIN_PASSES} passes; deferring to next flush");
        Ok(report)
    }

    fn refresh_decorations(&mut self) -> Result<(), GalleryError> {
        let Some(attachment) = self.attachment.as_mut() else {
            return Ok(());
        };
        let decorations = attachment
            .gallery
            .params()
            .resolve(&attachment.context, self.config.density)?;
        if decorations != attachment.decorations {
            log::debug!("decorations of {} changed", attachment.collection_id);
            self.toolkit.borrow_mut().apply_decorations(&decorations);
            attachment.decorations = decorations;
        }
        Ok(())
    }

    /// Resolves the latest source and patches the slots to match it.
    fn reconcile(&mut self) -> Result<BindReport, GalleryError> {
        let Some(attachment) = self.attachment.as_ref() else {
            return Ok(BindReport::default());
        };
        let context = attachment.context.clone();
        let new_source = self.pending_source.take();
        let source = new_source.as_ref().unwrap_or(&attachment.source);

        let items = resolve_items(source, &context)?;
        let script = self.differ.diff(self.items.as_slice(), items.as_slice());
        log::trace!(
            "reconciling {} -> {} items with {} ops",
            self.items.len(),
            items.len(),
            script.len()
        );

        let mut report = BindReport::default();
        if let Err(err) = script.validate(self.items.len()) {
            log::error!("{err}; rebuilding the whole collection");
            self.rebuild_all(items, &mut report);
            if let Some(source) = new_source {
                self.replace_source(source);
            }
            return Err(err.into());
        }

        for op in script.into_ops() {
            match op {
                PatchOp::Remove { index, .. } => {
                    let slot = self.slots.remove(index);
                    self.recycle_slot(slot);
                    report.removed += 1;
                }
                PatchOp::Move { from, to } => {
                    let slot = self.slots.remove(from);
                    self.slots.insert(to, slot);
                    report.moved += 1;
                }
                PatchOp::Insert { index, .. } => {
                    self.slots.insert(index, Slot::Unbound);
                    report.inserted += 1;
                }
            }
        }
        self.items = items;

        let previous = self.position.index;
        let items = &self.items;
        self.position
            .follow_anchor(items.len(), |key| items.index_of_key(key));
        if self.position.index != previous {
            self.toolkit
                .borrow_mut()
                .set_scroll_position(self.position.index, self.position.offset);
        }

        if let Some(source) = new_source {
            self.replace_source(source);
        }
        self.layout_window(&mut report);
        self.update_stats();
        Ok(report)
    }

    /// Recycles every slot and binds `items` from scratch.
    fn rebuild_all(&mut self, items: ItemSequence, report: &mut BindReport) {
        for slot in std::mem::take(&mut self.slots) {
            self.recycle_slot(slot);
        }
        report.removed += self.items.len();
        report.inserted += items.len();
        self.slots = items.iter().map(|_| Slot::Unbound).collect();
        self.items = items;
        self.position.index = self.position.index.min(self.items.len().saturating_sub(1));
        self.layout_window(report);
        self.update_stats();
    }

    fn replace_source(&mut self, source: ItemSource) {
        let callback = self.signal.source_callback();
        if let Some(attachment) = self.attachment.as_mut() {
            attachment.source_subscriptions =
                subscribe_source(&source, &attachment.context, callback);
            attachment.source = source;
        }
    }

    fn resubscribe(&mut self) {
        let source_callback = self.signal.source_callback();
        let decorations_callback = self.signal.decorations_callback();
        let Some(attachment) = self.attachment.as_mut() else {
            return;
        };
        attachment.source_subscriptions =
            subscribe_source(&attachment.source, &attachment.context, source_callback);
        attachment.decoration_subscriptions = attachment
            .gallery
            .params()
            .subscribe(&attachment.context, decorations_callback);
    }

    /// Binds every slot in the window and recycles every slot outside it.
    fn layout_window(&mut self, report: &mut BindReport) {
        self.move_placeholders();
        let range = self.visible_range();
        for index in 0..self.slots.len() {
            if range.contains(&index) {
                self.bind_slot(index, report);
            } else if !matches!(self.slots[index], Slot::Unbound) {
                let slot = std::mem::replace(&mut self.slots[index], Slot::Unbound);
                self.recycle_slot(slot);
            }
        }
    }

    /// Moves placeholders of failed slots that a patch shifted.
    ///
    /// All stale positions are cleared before any new one is placed, so a
    /// placeholder moving onto another's old index survives.
    fn move_placeholders(&mut self) {
        let shifted: Vec<(usize, usize)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Failed { placed_at, .. } if *placed_at != index => Some((*placed_at, index)),
                _ => None,
            })
            .collect();
        if shifted.is_empty() {
            return;
        }
        let mut toolkit = self.toolkit.borrow_mut();
        for (old, _) in &shifted {
            toolkit.clear_placeholder(*old);
        }
        for (_, new) in &shifted {
            toolkit.place_placeholder(*new);
        }
        drop(toolkit);
        for (_, new) in shifted {
            if let Slot::Failed { placed_at, .. } = &mut self.slots[new] {
                *placed_at = new;
            }
        }
    }

    fn bind_slot(&mut self, index: usize, report: &mut BindReport) {
        let item = self.items[index].clone();
        let next = match std::mem::replace(&mut self.slots[index], Slot::Unbound) {
            Slot::Bound(holder) => self.update_holder(index, holder, item, report),
            Slot::Failed { item: failed, placed_at } if failed.same_binding(&item) => Slot::Failed {
                item: failed,
                placed_at,
            },
            Slot::Failed { placed_at, .. } => {
                self.toolkit.borrow_mut().clear_placeholder(placed_at);
                let shape = item.resolved_shape();
                self.fill_slot(index, item, shape, report)
            }
            Slot::Unbound => {
                let shape = item.resolved_shape();
                self.fill_slot(index, item, shape, report)
            }
        };
        self.slots[index] = next;
    }

    /// Keeps, rebinds or replaces the holder of a visible slot.
    ///
    /// An unchanged binding is kept unless one of its structural
    /// subscriptions fired. Otherwise the view is rebound when the item still
    /// resolves to the shape the view was built for, and replaced when not.
    fn update_holder(
        &mut self,
        index: usize,
        mut holder: ViewHolder,
        item: ItemDescriptor,
        report: &mut BindReport,
    ) -> Slot {
        let unchanged = holder
            .last_item()
            .is_some_and(|last| last.same_binding(&item));
        if unchanged && !holder.is_stale() {
            self.toolkit.borrow_mut().place_view(index, holder.view());
            return Slot::Bound(holder);
        }

        let shape = item.resolved_shape();
        let replaceable = holder.view_type() == &self.binder.view_type(&item)
            && holder.shape() == shape
            && holder.last_item().is_some();
        if !replaceable {
            log::trace!("item {index} changed shape; replacing view {}", holder.id());
            report.rebuilt += 1;
            self.stats.rebuild_count += 1;
            self.recycle_holder(holder);
            return self.fill_slot(index, item, shape, report);
        }

        let invalidate = self.signal.source_callback();
        match holder.bind(&self.binder, &item, &invalidate) {
            Ok(()) => {
                report.rebound += 1;
                self.stats.rebind_count += 1;
                self.toolkit.borrow_mut().place_view(index, holder.view());
                Slot::Bound(holder)
            }
            Err(error) => {
                self.recycle_holder(holder);
                self.fail_slot(index, item, error, report)
            }
        }
    }

    /// Binds a pooled or freshly built holder to `item`.
    fn fill_slot(
        &mut self,
        index: usize,
        item: ItemDescriptor,
        shape: ShapeSignature,
        report: &mut BindReport,
    ) -> Slot {
        let view_type = self.binder.view_type(&item);
        let acquired = self.pool.borrow_mut().acquire(&view_type, shape);
        let pooled = match acquired {
            Ok(holder) => holder,
            Err(err) => {
                self.integrity_violation(err);
                None
            }
        };

        let mut holder = match pooled {
            Some(holder) => {
                report.reused += 1;
                self.stats.reuse_count += 1;
                holder
            }
            None => {
                let built = self
                    .binder
                    .build_view(&mut *self.toolkit.borrow_mut(), &item);
                match built {
                    Ok(view) => {
                        report.built += 1;
                        self.stats.total_built += 1;
                        ViewHolder::new(view, shape)
                    }
                    Err(error) => return self.fail_slot(index, item, error, report),
                }
            }
        };

        let invalidate = self.signal.source_callback();
        match holder.bind(&self.binder, &item, &invalidate) {
            Ok(()) => {
                self.toolkit.borrow_mut().place_view(index, holder.view());
                Slot::Bound(holder)
            }
            Err(error) => {
                self.recycle_holder(holder);
                self.fail_slot(index, item, error, report)
            }
        }
    }

    fn fail_slot(
        &mut self,
        index: usize,
        item: ItemDescriptor,
        error: BuildError,
        report: &mut BindReport,
    ) -> Slot {
        log::warn!("gallery item {index} failed: {error}");
        self.toolkit.borrow_mut().place_placeholder(index);
        self.stats.failed_count += 1;
        report.failures.push(ItemFailure {
            index,
            key: item.key().cloned(),
            error,
        });
        Slot::Failed {
            item,
            placed_at: index,
        }
    }

    fn recycle_slot(&mut self, slot: Slot) {
        match slot {
            Slot::Bound(holder) => self.recycle_holder(holder),
            Slot::Failed { placed_at, .. } => {
                self.toolkit.borrow_mut().clear_placeholder(placed_at)
            }
            Slot::Unbound => {}
        }
    }

    /// Detaches the view, cancels its subscriptions and returns it to the pool.
    fn recycle_holder(&mut self, mut holder: ViewHolder) {
        holder.unbind();
        let released = {
            let mut toolkit = self.toolkit.borrow_mut();
            toolkit.remove_view(holder.view());
            self.pool.borrow_mut().release(holder, &mut *toolkit)
        };
        if let Err(err) = released {
            self.integrity_violation(err);
        }
    }

    fn integrity_violation(&self, err: PoolIntegrityError) {
        if self.pool.borrow().policy().strict_integrity {
            panic!("view pool integrity violated: {err}");
        }
        log::error!("view pool integrity violated: {err}; rebuilding the slot");
        self.pool
            .borrow_mut()
            .drain_quarantine(&mut *self.toolkit.borrow_mut());
    }

    fn teardown(&mut self, mode: Detach) {
        let Some(attachment) = self.attachment.take() else {
            return;
        };
        self.signal.detach();
        self.pending_source = None;
        match mode {
            Detach::Transient => self.scroll_store.save(
                &attachment.collection_id,
                self.position.index,
                self.position.offset,
            ),
            Detach::Permanent => {
                self.scroll_store.evict(&attachment.collection_id);
                self.position = ScrollPosition::default();
            }
        }
        log::debug!("detaching gallery {} ({mode:?})", attachment.collection_id);
        drop(attachment);

        for slot in std::mem::take(&mut self.slots) {
            self.recycle_slot(slot);
        }
        self.items = ItemSequence::default();
        self.update_stats();
    }

    fn update_stats(&mut self) {
        self.stats.items_in_use = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Bound(_)))
            .count();
        self.stats.items_in_pool = self.pool.borrow().available_count();
    }
}
