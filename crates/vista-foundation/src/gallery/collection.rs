use std::rc::Rc;

use super::decorations::GalleryParams;
use super::item_source::ItemSource;
use super::scroll_state::CollectionId;

/// A gallery as handed to the adapter: identity, parameters and items.
#[derive(Clone, Debug)]
pub struct Gallery {
    id: Option<Rc<str>>,
    params: GalleryParams,
    source: ItemSource,
}

impl Gallery {
    pub fn new(source: ItemSource) -> Self {
        Self {
            id: None,
            params: GalleryParams::default(),
            source,
        }
    }

    pub fn with_id(mut self, id: impl Into<Rc<str>>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_params(mut self, params: GalleryParams) -> Self {
        self.params = params;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn params(&self) -> &GalleryParams {
        &self.params
    }

    pub fn source(&self) -> &ItemSource {
        &self.source
    }

    /// Explicit id when present, otherwise the shape hash of the source.
    pub fn collection_id(&self) -> CollectionId {
        match &self.id {
            Some(id) => CollectionId::explicit(id.clone()),
            None => CollectionId::from_shape(self.source.shape_hash()),
        }
    }
}
