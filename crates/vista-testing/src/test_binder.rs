use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::FxHashSet;
use vista_core::ResolutionError;
use vista_foundation::{
    BindScope, BuildError, ItemBinder, ItemDescriptor, ItemKey, PropertyBinder, ViewHandle,
    ViewToolkit, ViewType,
};

#[derive(Default)]
struct Counters {
    builds: Cell<usize>,
    binds: Cell<usize>,
    failing_binds: RefCell<FxHashSet<ItemKey>>,
}

/// [`PropertyBinder`] with instrumentation and injectable bind failures.
///
/// Clones share counters, so a test can keep one while the adapter owns
/// the other.
#[derive(Clone, Default)]
pub struct CountingBinder {
    inner: PropertyBinder,
    counters: Rc<Counters>,
}

impl CountingBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `build_view` calls, successful or not.
    pub fn build_count(&self) -> usize {
        self.counters.builds.get()
    }

    pub fn bind_count(&self) -> usize {
        self.counters.binds.get()
    }

    /// Makes binding the item with `key` fail.
    pub fn fail_binding(&self, key: impl Into<ItemKey>) {
        self.counters.failing_binds.borrow_mut().insert(key.into());
    }

    pub fn clear_failures(&self) {
        self.counters.failing_binds.borrow_mut().clear();
    }
}

impl ItemBinder for CountingBinder {
    fn view_type(&self, item: &ItemDescriptor) -> ViewType {
        self.inner.view_type(item)
    }

    fn build_view(
        &self,
        toolkit: &mut dyn ViewToolkit,
        item: &ItemDescriptor,
    ) -> Result<ViewHandle, BuildError> {
        self.counters.builds.set(self.counters.builds.get() + 1);
        self.inner.build_view(toolkit, item)
    }

    fn bind_view(
        &self,
        view: &ViewHandle,
        item: &ItemDescriptor,
        scope: &mut BindScope<'_>,
    ) -> Result<(), BuildError> {
        self.counters.binds.set(self.counters.binds.get() + 1);
        if let Some(key) = item.key() {
            if self.counters.failing_binds.borrow().contains(key) {
                return Err(ResolutionError::evaluation(key.to_string(), "injected failure").into());
            }
        }
        self.inner.bind_view(view, item, scope)
    }
}
