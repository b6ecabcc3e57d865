use std::rc::Rc;

use vista_core::SubscriptionScope;

use super::binder::{BindScope, BindingToken, ItemBinder};
use super::comparator::ShapeSignature;
use super::descriptor::ItemDescriptor;
use super::error::BuildError;
use super::toolkit::{ViewHandle, ViewId, ViewType};

struct ActiveBinding {
    subscriptions: SubscriptionScope,
    token: BindingToken,
}

/// One platform view plus the item it was last bound to.
///
/// While bound, the holder owns the subscriptions that keep the view's leaf
/// values current. They are torn down before any rebind. The shape the view
/// was built for never changes; an item of another shape needs another view.
pub struct ViewHolder {
    view: ViewHandle,
    shape: ShapeSignature,
    last_item: Option<ItemDescriptor>,
    binding: Option<ActiveBinding>,
}

impl ViewHolder {
    pub fn new(view: ViewHandle, shape: ShapeSignature) -> Self {
        Self {
            view,
            shape,
            last_item: None,
            binding: None,
        }
    }

    pub fn view(&self) -> &ViewHandle {
        &self.view
    }

    pub fn id(&self) -> ViewId {
        self.view.id
    }

    pub fn view_type(&self) -> &ViewType {
        &self.view.view_type
    }

    pub fn shape(&self) -> ShapeSignature {
        self.shape
    }

    pub fn last_item(&self) -> Option<&ItemDescriptor> {
        self.last_item.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// A structural subscription of the current binding fired since it
    /// was made.
    pub fn is_stale(&self) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|binding| binding.token.is_stale())
    }

    pub fn subscription_count(&self) -> usize {
        self.binding
            .as_ref()
            .map_or(0, |binding| binding.subscriptions.len())
    }

    /// Binds the view to `item`, replacing any previous binding.
    ///
    /// On failure the holder is left unbound with no live subscriptions.
    pub fn bind<B: ItemBinder + ?Sized>(
        &mut self,
        binder: &B,
        item: &ItemDescriptor,
        invalidate: &Rc<dyn Fn()>,
    ) -> Result<(), BuildError> {
        self.unbind();
        let token = BindingToken::new();
        let mut subscriptions = SubscriptionScope::new();
        let result = {
            let mut scope = BindScope::new(&mut subscriptions, &token, invalidate);
            binder.bind_view(&self.view, item, &mut scope)
        };
        match result {
            Ok(()) => {
                self.last_item = Some(item.clone());
                self.binding = Some(ActiveBinding {
                    subscriptions,
                    token,
                });
                Ok(())
            }
            Err(err) => {
                token.invalidate();
                self.last_item = None;
                Err(err)
            }
        }
    }

    /// Invalidates the binding token and drops every subscription.
    pub fn unbind(&mut self) {
        if let Some(binding) = self.binding.take() {
            binding.token.invalidate();
        }
    }

    pub fn into_view(mut self) -> ViewHandle {
        self.unbind();
        self.view
    }
}
