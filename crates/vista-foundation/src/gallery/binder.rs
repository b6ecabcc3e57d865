//! Per-kind capability interface used by the adapter.

use std::cell::Cell;
use std::rc::Rc;

use vista_core::{Expression, ResolverRef, SubscriptionScope};

use super::descriptor::{DescriptorNode, ItemDescriptor, NodeChildren};
use super::error::BuildError;
use super::item_source::build_items;
use super::toolkit::{PlatformView, ViewHandle, ViewToolkit, ViewType};

#[derive(Debug, Default)]
struct TokenState {
    retired: Cell<bool>,
    stale: Cell<bool>,
}

/// Liveness flag shared by every callback of one binding.
///
/// Invalidated before the holder's subscriptions are dropped, so a callback
/// already queued by the engine can never write into a rebound view. A
/// binding turns stale when something it resolved structurally changed;
/// the adapter then re-checks the view's shape instead of trusting it.
#[derive(Clone, Debug, Default)]
pub struct BindingToken(Rc<TokenState>);

impl BindingToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_live(&self) -> bool {
        !self.0.retired.get()
    }

    pub fn invalidate(&self) {
        self.0.retired.set(true);
    }

    pub fn mark_stale(&self) {
        self.0.stale.set(true);
    }

    pub fn is_stale(&self) -> bool {
        self.0.stale.get()
    }
}

/// Where a binder registers the subscriptions of one binding.
pub struct BindScope<'a> {
    subscriptions: &'a mut SubscriptionScope,
    token: &'a BindingToken,
    invalidate: &'a Rc<dyn Fn()>,
}

impl<'a> BindScope<'a> {
    pub fn new(
        subscriptions: &'a mut SubscriptionScope,
        token: &'a BindingToken,
        invalidate: &'a Rc<dyn Fn()>,
    ) -> Self {
        Self {
            subscriptions,
            token,
            invalidate,
        }
    }

    /// Runs `apply` on every change of `expression` while the binding lives.
    pub fn observe_leaf(
        &mut self,
        context: &ResolverRef,
        expression: &Expression,
        apply: impl Fn() + 'static,
    ) {
        let token = self.token.clone();
        self.subscriptions.observe(
            context,
            expression,
            Rc::new(move || {
                if token.is_live() {
                    apply();
                }
            }),
        );
    }

    /// Marks the binding stale and requests a reconcile on every change of
    /// `expression`.
    pub fn observe_structure(&mut self, context: &ResolverRef, expression: &Expression) {
        let token = self.token.clone();
        let invalidate = Rc::clone(self.invalidate);
        self.subscriptions.observe(
            context,
            expression,
            Rc::new(move || {
                if token.is_live() {
                    token.mark_stale();
                    invalidate();
                }
            }),
        );
    }

    pub fn token(&self) -> &BindingToken {
        self.token
    }
}

/// Builds and binds views for one family of item kinds.
pub trait ItemBinder {
    /// Pool key; views of equal type must accept any item mapped to it.
    fn view_type(&self, item: &ItemDescriptor) -> ViewType;

    fn build_view(
        &self,
        toolkit: &mut dyn ViewToolkit,
        item: &ItemDescriptor,
    ) -> Result<ViewHandle, BuildError> {
        toolkit.create_view(&self.view_type(item))
    }

    /// Pushes the item's leaf values into `view` and subscribes to them.
    fn bind_view(
        &self,
        view: &ViewHandle,
        item: &ItemDescriptor,
        scope: &mut BindScope<'_>,
    ) -> Result<(), BuildError>;
}

impl<B: ItemBinder + ?Sized> ItemBinder for Rc<B> {
    fn view_type(&self, item: &ItemDescriptor) -> ViewType {
        (**self).view_type(item)
    }

    fn build_view(
        &self,
        toolkit: &mut dyn ViewToolkit,
        item: &ItemDescriptor,
    ) -> Result<ViewHandle, BuildError> {
        (**self).build_view(toolkit, item)
    }

    fn bind_view(
        &self,
        view: &ViewHandle,
        item: &ItemDescriptor,
        scope: &mut BindScope<'_>,
    ) -> Result<(), BuildError> {
        (**self).bind_view(view, item, scope)
    }
}

/// Generic binder: one view type per node kind, leaf properties written as
/// dotted paths (`children.1.text`, `items.0.title`).
#[derive(Clone, Copy, Debug, Default)]
pub struct PropertyBinder;

impl PropertyBinder {
    fn bind_node(
        &self,
        view: &Rc<dyn PlatformView>,
        node: &DescriptorNode,
        context: &ResolverRef,
        prefix: &str,
        scope: &mut BindScope<'_>,
    ) -> Result<(), BuildError> {
        for (name, expression) in node.properties() {
            let path: Rc<str> = format!("{prefix}{name}").into();
            view.set_property(&path, &context.evaluate(expression)?);

            let view = Rc::clone(view);
            let refresh_context = context.clone();
            let refresh_expression = expression.clone();
            scope.observe_leaf(context, expression, move || {
                match refresh_context.evaluate(&refresh_expression) {
                    Ok(value) => view.set_property(&path, &value),
                    Err(err) => log::warn!("failed to refresh {path}: {err}"),
                }
            });
        }

        for (_, expression) in node.structure() {
            scope.observe_structure(context, expression);
        }

        match node.children() {
            NodeChildren::Static(children) => {
                for (index, child) in children.iter().enumerate() {
                    let prefix = format!("{prefix}children.{index}.");
                    self.bind_node(view, child, context, &prefix, scope)?;
                }
            }
            NodeChildren::Builder(builder) => {
                scope.observe_structure(context, &builder.data);
                for (index, item) in build_items(builder, context)?.iter().enumerate() {
                    let prefix = format!("{prefix}items.{index}.");
                    self.bind_node(view, item.node(), item.context(), &prefix, scope)?;
                }
            }
        }
        Ok(())
    }
}

impl ItemBinder for PropertyBinder {
    fn view_type(&self, item: &ItemDescriptor) -> ViewType {
        ViewType::new(item.node().kind().as_str())
    }

    fn bind_view(
        &self,
        view: &ViewHandle,
        item: &ItemDescriptor,
        scope: &mut BindScope<'_>,
    ) -> Result<(), BuildError> {
        self.bind_node(&view.view, item.node(), item.context(), "", scope)
    }
}
