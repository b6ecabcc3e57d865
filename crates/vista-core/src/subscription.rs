//! Ownership of expression subscriptions.
//!
//! A [`Subscription`] unsubscribes when dropped, so whoever owns it owns the
//! lifetime of the callback. [`SubscriptionScope`] groups the subscriptions
//! that belong to one binding so they can be torn down together.

use std::fmt;
use std::rc::Rc;

use crate::expression::{Expression, ResolverRef, SubscriptionHandle};

pub struct Subscription {
    resolver: ResolverRef,
    handle: SubscriptionHandle,
}

impl Subscription {
    pub fn new(resolver: ResolverRef, handle: SubscriptionHandle) -> Self {
        Self { resolver, handle }
    }

    /// Subscribes `callback` to `expression` in `resolver`.
    ///
    /// Returns `None` for expressions that read no variables.
    pub fn observe(
        resolver: &ResolverRef,
        expression: &Expression,
        callback: Rc<dyn Fn()>,
    ) -> Option<Self> {
        resolver
            .subscribe(expression, callback)
            .map(|handle| Self::new(Rc::clone(resolver), handle))
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.resolver.unsubscribe(self.handle);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("resolver", &self.resolver.id())
            .field("handle", &self.handle)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct SubscriptionScope {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Subscribes and keeps the subscription in this scope.
    pub fn observe(
        &mut self,
        resolver: &ResolverRef,
        expression: &Expression,
        callback: Rc<dyn Fn()>,
    ) {
        if let Some(subscription) = Subscription::observe(resolver, expression, callback) {
            self.subscriptions.push(subscription);
        }
    }

    pub fn extend(&mut self, other: SubscriptionScope) {
        self.subscriptions.extend(other.subscriptions);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Unsubscribes everything held by this scope.
    pub fn close_all(&mut self) {
        if !self.subscriptions.is_empty() {
            log::trace!("closing {} subscriptions", self.subscriptions.len());
        }
        self.subscriptions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolutionError;
    use crate::expression::{ExpressionResolver, ResolverId};
    use crate::value::Value;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        next: RefCell<u64>,
        live: RefCell<Vec<u64>>,
    }

    impl ExpressionResolver for Recorder {
        fn id(&self) -> ResolverId {
            ResolverId(0)
        }

        fn evaluate(&self, expression: &Expression) -> Result<Value, ResolutionError> {
            match expression {
                Expression::Constant(value) => Ok(value.clone()),
                other => Err(ResolutionError::evaluation(other.to_string(), "unsupported")),
            }
        }

        fn subscribe(
            &self,
            expression: &Expression,
            _callback: Rc<dyn Fn()>,
        ) -> Option<SubscriptionHandle> {
            if expression.is_constant() {
                return None;
            }
            let mut next = self.next.borrow_mut();
            *next += 1;
            self.live.borrow_mut().push(*next);
            Some(SubscriptionHandle(*next))
        }

        fn unsubscribe(&self, handle: SubscriptionHandle) {
            self.live.borrow_mut().retain(|id| *id != handle.0);
        }

        fn scoped(&self, _name: &str, _value: Value) -> ResolverRef {
            Rc::new(Recorder::default())
        }
    }

    #[test]
    fn dropping_scope_unsubscribes() {
        let recorder = Rc::new(Recorder::default());
        let resolver: ResolverRef = recorder.clone();
        let mut scope = SubscriptionScope::new();
        scope.observe(&resolver, &Expression::variable("a"), Rc::new(|| {}));
        scope.observe(&resolver, &Expression::variable("b"), Rc::new(|| {}));
        scope.observe(&resolver, &Expression::constant(1), Rc::new(|| {}));

        assert_eq!(scope.len(), 2);
        assert_eq!(recorder.live.borrow().len(), 2);

        drop(scope);
        assert!(recorder.live.borrow().is_empty());
    }

    #[test]
    fn close_all_keeps_scope_usable() {
        let recorder = Rc::new(Recorder::default());
        let resolver: ResolverRef = recorder.clone();
        let mut scope = SubscriptionScope::new();
        scope.observe(&resolver, &Expression::variable("a"), Rc::new(|| {}));
        scope.close_all();
        assert!(scope.is_empty());
        assert!(recorder.live.borrow().is_empty());

        scope.observe(&resolver, &Expression::variable("a"), Rc::new(|| {}));
        assert_eq!(recorder.live.borrow().as_slice(), &[2]);
    }
}
