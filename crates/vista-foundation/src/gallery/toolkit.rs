//! Interface to the platform view toolkit.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use vista_core::Value;

use super::decorations::GalleryDecorations;
use super::error::BuildError;

/// Tag keying the view pool. Views of equal type are interchangeable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewType(Rc<str>);

impl ViewType {
    pub fn new(tag: impl Into<Rc<str>>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ViewType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live platform view.
pub trait PlatformView {
    /// Applies a resolved leaf value. `name` is a dotted path such as
    /// `children.0.text` for values of nested nodes.
    fn set_property(&self, name: &str, value: &Value);

    /// Clears per-item state before the view is pooled.
    fn reset(&self) {}
}

/// One platform view instance.
#[derive(Clone)]
pub struct ViewHandle {
    pub id: ViewId,
    pub view_type: ViewType,
    pub view: Rc<dyn PlatformView>,
}

impl fmt::Debug for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewHandle")
            .field("id", &self.id)
            .field("view_type", &self.view_type)
            .finish_non_exhaustive()
    }
}

/// The host toolkit as seen by the gallery adapter.
///
/// Indices are item indices in the current sequence; mapping them to pixels
/// is the toolkit's business.
pub trait ViewToolkit {
    fn create_view(&mut self, view_type: &ViewType) -> Result<ViewHandle, BuildError>;

    fn destroy_view(&mut self, view: ViewHandle);

    /// Attaches `view` (or moves it) to the slot for item `index`.
    fn place_view(&mut self, index: usize, view: &ViewHandle);

    fn remove_view(&mut self, view: &ViewHandle);

    /// Shows an empty placeholder of the slot's prior size at `index`.
    fn place_placeholder(&mut self, index: usize);

    fn clear_placeholder(&mut self, index: usize);

    fn set_scroll_position(&mut self, index: usize, offset: i32);

    fn apply_decorations(&mut self, decorations: &GalleryDecorations);
}

pub type SharedToolkit = Rc<RefCell<dyn ViewToolkit>>;
