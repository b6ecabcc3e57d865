//! Pending-work signal between subscription callbacks and the adapter.
//!
//! Callbacks fired by the expression engine only flip flags here; the adapter
//! drains them later. Requests coalesce: any number of changes before the
//! next drain produce one reconcile against the latest state.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

#[derive(Default)]
struct SignalInner {
    source_dirty: Cell<bool>,
    decorations_dirty: Cell<bool>,
    detached: Cell<bool>,
    in_flight: Cell<bool>,
    /// Invalidation callbacks, notified when work becomes pending.
    invalidate_callbacks: RefCell<Vec<(u64, Rc<dyn Fn()>)>>,
    next_callback_id: Cell<u64>,
}

impl SignalInner {
    fn request(&self, flag: &Cell<bool>) {
        if self.detached.get() || flag.replace(true) {
            return;
        }
        if self.in_flight.get() {
            // The running drain loops until both flags are clear.
            return;
        }
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .invalidate_callbacks
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}

#[derive(Clone, Default)]
pub struct RebindSignal {
    inner: Rc<SignalInner>,
}

impl RebindSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// The item source must be re-resolved.
    pub fn request_source(&self) {
        self.inner.request(&self.inner.source_dirty);
    }

    /// Gallery parameters must be re-evaluated.
    pub fn request_decorations(&self) {
        self.inner.request(&self.inner.decorations_dirty);
    }

    /// Callback for subscriptions that affect the item sequence.
    ///
    /// Holds the signal weakly, so it outlives the adapter harmlessly.
    pub fn source_callback(&self) -> Rc<dyn Fn()> {
        let inner = Rc::downgrade(&self.inner);
        Rc::new(move || {
            if let Some(inner) = Weak::upgrade(&inner) {
                inner.request(&inner.source_dirty);
            }
        })
    }

    pub fn decorations_callback(&self) -> Rc<dyn Fn()> {
        let inner = Rc::downgrade(&self.inner);
        Rc::new(move || {
            if let Some(inner) = Weak::upgrade(&inner) {
                inner.request(&inner.decorations_dirty);
            }
        })
    }

    pub fn is_pending(&self) -> bool {
        self.inner.source_dirty.get() || self.inner.decorations_dirty.get()
    }

    pub fn take_source(&self) -> bool {
        self.inner.source_dirty.replace(false)
    }

    pub fn take_decorations(&self) -> bool {
        self.inner.decorations_dirty.replace(false)
    }

    /// Drops pending work and ignores every later request until reattached.
    pub fn detach(&self) {
        self.inner.detached.set(true);
        self.inner.source_dirty.set(false);
        self.inner.decorations_dirty.set(false);
    }

    pub fn reattach(&self) {
        self.inner.detached.set(false);
        self.inner.source_dirty.set(false);
        self.inner.decorations_dirty.set(false);
    }

    pub fn is_detached(&self) -> bool {
        self.inner.detached.get()
    }

    /// Starts a drain. Returns `None` when one is already running.
    pub fn begin_flight(&self) -> Option<FlightGuard> {
        if self.inner.in_flight.replace(true) {
            return None;
        }
        Some(FlightGuard {
            inner: Rc::clone(&self.inner),
        })
    }

    pub fn add_invalidate_callback(&self, callback: Rc<dyn Fn()>) -> u64 {
        let id = self.inner.next_callback_id.get();
        self.inner.next_callback_id.set(id + 1);
        self.inner
            .invalidate_callbacks
            .borrow_mut()
            .push((id, callback));
        id
    }

    pub fn remove_invalidate_callback(&self, id: u64) {
        self.inner
            .invalidate_callbacks
            .borrow_mut()
            .retain(|(cb_id, _)| *cb_id != id);
    }
}

/// Clears the in-flight flag when dropped.
pub struct FlightGuard {
    inner: Rc<SignalInner>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight.set(false);
    }
}
