use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use vista_core::{Expression, ResolverRef};
use vista_foundation::{
    BindReport, DescriptorNode, Gallery, GalleryAdapter, GalleryConfig, GalleryError, ItemSource,
    PoolPolicy, ScrollStateStore, SharedToolkit, SharedViewPool, ViewPool,
};

use super::test_binder::CountingBinder;
use super::test_resolver::TestResolver;
use super::test_toolkit::RecordingToolkit;

/// A gallery adapter wired to test doubles.
///
/// ```rust,ignore
/// let mut rule = GalleryTestRule::new();
/// rule.bind(Gallery::new(ItemSource::from_nodes([card("a", Expression::constant("A"))]))).unwrap();
/// assert_eq!(rule.toolkit().created_count(), 1);
/// ```
pub struct GalleryTestRule {
    resolver: Rc<TestResolver>,
    toolkit: Rc<RefCell<RecordingToolkit>>,
    pool: SharedViewPool,
    store: ScrollStateStore,
    binder: CountingBinder,
    adapter: GalleryAdapter<CountingBinder>,
}

impl GalleryTestRule {
    pub fn new() -> Self {
        Self::with_setup(PoolPolicy::default(), GalleryConfig::default())
    }

    pub fn with_policy(policy: PoolPolicy) -> Self {
        Self::with_setup(policy, GalleryConfig::default())
    }

    pub fn with_config(config: GalleryConfig) -> Self {
        Self::with_setup(PoolPolicy::default(), config)
    }

    pub fn with_setup(policy: PoolPolicy, config: GalleryConfig) -> Self {
        Self::sharing(
            TestResolver::new(),
            ViewPool::shared(policy),
            ScrollStateStore::new(),
            config,
        )
    }

    /// A rule that shares the resolver, pool and scroll store of `other`
    /// but has its own toolkit and adapter.
    pub fn sibling_of(other: &GalleryTestRule) -> Self {
        Self::sharing(
            Rc::clone(&other.resolver),
            Rc::clone(&other.pool),
            other.store.clone(),
            GalleryConfig::default(),
        )
    }

    fn sharing(
        resolver: Rc<TestResolver>,
        pool: SharedViewPool,
        store: ScrollStateStore,
        config: GalleryConfig,
    ) -> Self {
        let toolkit = RecordingToolkit::shared();
        let shared_toolkit: SharedToolkit = toolkit.clone();
        let binder = CountingBinder::new();
        let adapter = GalleryAdapter::with_config(
            binder.clone(),
            shared_toolkit,
            Rc::clone(&pool),
            store.clone(),
            config,
        );
        Self {
            resolver,
            toolkit,
            pool,
            store,
            binder,
            adapter,
        }
    }

    pub fn resolver(&self) -> &Rc<TestResolver> {
        &self.resolver
    }

    pub fn context(&self) -> ResolverRef {
        self.resolver.context()
    }

    pub fn toolkit(&self) -> Ref<'_, RecordingToolkit> {
        self.toolkit.borrow()
    }

    pub fn toolkit_mut(&self) -> RefMut<'_, RecordingToolkit> {
        self.toolkit.borrow_mut()
    }

    pub fn pool(&self) -> Ref<'_, ViewPool> {
        self.pool.borrow()
    }

    pub fn pool_mut(&self) -> RefMut<'_, ViewPool> {
        self.pool.borrow_mut()
    }

    pub fn store(&self) -> &ScrollStateStore {
        &self.store
    }

    pub fn binder(&self) -> &CountingBinder {
        &self.binder
    }

    pub fn adapter(&self) -> &GalleryAdapter<CountingBinder> {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut GalleryAdapter<CountingBinder> {
        &mut self.adapter
    }

    /// Binds `gallery` against the root context.
    pub fn bind(&mut self, gallery: impl Into<Rc<Gallery>>) -> Result<BindReport, GalleryError> {
        let context = self.context();
        self.adapter.bind(gallery.into(), context)
    }

    pub fn apply_patch(&mut self, source: ItemSource) -> Result<BindReport, GalleryError> {
        self.adapter.apply_patch(source)
    }

    pub fn flush(&mut self) -> Result<BindReport, GalleryError> {
        self.adapter.flush()
    }

    /// Title text of the view placed at `index`.
    pub fn title_at(&self, index: usize) -> Option<String> {
        self.toolkit.borrow().view_at(index)?.text("title")
    }
}

impl Default for GalleryTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// A `card` node with an id and a `title` leaf property.
pub fn card(id: &str, title: impl Into<Expression>) -> DescriptorNode {
    DescriptorNode::new("card")
        .with_id(id)
        .property("title", title)
}

/// A static source of titled cards, titles taken from the ids.
pub fn cards(ids: &[&str]) -> ItemSource {
    ItemSource::from_nodes(
        ids.iter()
            .map(|id| card(id, Expression::constant(id.to_uppercase()))),
    )
}
