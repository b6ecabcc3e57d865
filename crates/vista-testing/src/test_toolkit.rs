use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use vista_core::Value;
use vista_foundation::{
    BuildError, GalleryDecorations, PlatformView, ViewHandle, ViewId, ViewToolkit, ViewType,
};

/// View that remembers every property written to it.
#[derive(Default)]
pub struct RecordingView {
    properties: RefCell<FxHashMap<String, Value>>,
    writes: RefCell<usize>,
    resets: RefCell<usize>,
}

impl RecordingView {
    pub fn property(&self, name: &str) -> Option<Value> {
        self.properties.borrow().get(name).cloned()
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.property(name)
            .and_then(|value| value.as_str().map(str::to_owned))
    }

    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }

    pub fn reset_count(&self) -> usize {
        *self.resets.borrow()
    }
}

impl PlatformView for RecordingView {
    fn set_property(&self, name: &str, value: &Value) {
        *self.writes.borrow_mut() += 1;
        self.properties
            .borrow_mut()
            .insert(name.to_owned(), value.clone());
    }

    fn reset(&self) {
        *self.resets.borrow_mut() += 1;
        self.properties.borrow_mut().clear();
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ToolkitEvent {
    Created(ViewId, ViewType),
    Destroyed(ViewId),
    Placed(usize, ViewId),
    Removed(ViewId),
    Placeholder(usize),
    ClearedPlaceholder(usize),
    Scrolled(usize, i32),
    Decorated(GalleryDecorations),
}

/// Toolkit that records every call instead of drawing.
#[derive(Default)]
pub struct RecordingToolkit {
    next_id: u64,
    live: BTreeMap<ViewId, Rc<RecordingView>>,
    attached: BTreeMap<ViewId, usize>,
    placeholders: BTreeSet<usize>,
    events: Vec<ToolkitEvent>,
    created: usize,
    destroyed: usize,
    scroll_position: Option<(usize, i32)>,
    decorations: Option<GalleryDecorations>,
    failing: FxHashSet<ViewType>,
}

impl RecordingToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Makes `create_view` fail for `view_type`.
    pub fn fail_creating(&mut self, view_type: impl Into<ViewType>) {
        self.failing.insert(view_type.into());
    }

    pub fn view(&self, id: ViewId) -> Option<Rc<RecordingView>> {
        self.live.get(&id).cloned()
    }

    /// View currently placed at item `index`.
    pub fn view_at(&self, index: usize) -> Option<Rc<RecordingView>> {
        self.attached
            .iter()
            .find(|(_, at)| **at == index)
            .and_then(|(id, _)| self.view(*id))
    }

    pub fn id_at(&self, index: usize) -> Option<ViewId> {
        self.attached
            .iter()
            .find(|(_, at)| **at == index)
            .map(|(id, _)| *id)
    }

    pub fn events(&self) -> &[ToolkitEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    pub fn placeholders(&self) -> Vec<usize> {
        self.placeholders.iter().copied().collect()
    }

    pub fn scroll_position(&self) -> Option<(usize, i32)> {
        self.scroll_position
    }

    pub fn decorations(&self) -> Option<&GalleryDecorations> {
        self.decorations.as_ref()
    }

    pub fn decoration_updates(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, ToolkitEvent::Decorated(_)))
            .count()
    }
}

impl ViewToolkit for RecordingToolkit {
    fn create_view(&mut self, view_type: &ViewType) -> Result<ViewHandle, BuildError> {
        if self.failing.contains(view_type) {
            return Err(BuildError::create(view_type.clone(), "refused by test toolkit"));
        }
        self.next_id += 1;
        let id = ViewId(self.next_id);
        let view = Rc::new(RecordingView::default());
        self.live.insert(id, Rc::clone(&view));
        self.created += 1;
        self.events.push(ToolkitEvent::Created(id, view_type.clone()));
        Ok(ViewHandle {
            id,
            view_type: view_type.clone(),
            view,
        })
    }

    fn destroy_view(&mut self, view: ViewHandle) {
        self.live.remove(&view.id);
        self.attached.remove(&view.id);
        self.destroyed += 1;
        self.events.push(ToolkitEvent::Destroyed(view.id));
    }

    fn place_view(&mut self, index: usize, view: &ViewHandle) {
        self.attached.insert(view.id, index);
        self.events.push(ToolkitEvent::Placed(index, view.id));
    }

    fn remove_view(&mut self, view: &ViewHandle) {
        self.attached.remove(&view.id);
        self.events.push(ToolkitEvent::Removed(view.id));
    }

    fn place_placeholder(&mut self, index: usize) {
        self.placeholders.insert(index);
        self.events.push(ToolkitEvent::Placeholder(index));
    }

    fn clear_placeholder(&mut self, index: usize) {
        self.placeholders.remove(&index);
        self.events.push(ToolkitEvent::ClearedPlaceholder(index));
    }

    fn set_scroll_position(&mut self, index: usize, offset: i32) {
        self.scroll_position = Some((index, offset));
        self.events.push(ToolkitEvent::Scrolled(index, offset));
    }

    fn apply_decorations(&mut self, decorations: &GalleryDecorations) {
        self.decorations = Some(decorations.clone());
        self.events.push(ToolkitEvent::Decorated(decorations.clone()));
    }
}
