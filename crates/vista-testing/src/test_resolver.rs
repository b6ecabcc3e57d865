use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use vista_core::{
    Expression, ExpressionResolver, ResolutionError, ResolverId, ResolverRef, SubscriptionHandle,
    Value,
};

/// Evaluator for an opaque expression source.
pub type TestFunction = Rc<dyn Fn(&Lookup<'_>) -> Result<Value, ResolutionError>>;

/// Variable access handed to [`TestFunction`]s.
pub struct Lookup<'a> {
    resolver: &'a TestResolver,
}

impl Lookup<'_> {
    pub fn get(&self, name: &str) -> Result<Value, ResolutionError> {
        self.resolver.lookup(name)
    }
}

struct Watch {
    variables: Vec<Rc<str>>,
    callback: Rc<dyn Fn()>,
}

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

fn next_context_id() -> ResolverId {
    ResolverId(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
}

#[derive(Default)]
struct Shared {
    variables: RefCell<FxHashMap<Rc<str>, Value>>,
    functions: RefCell<FxHashMap<Rc<str>, TestFunction>>,
    watches: RefCell<BTreeMap<u64, Watch>>,
    next_handle: Cell<u64>,
    evaluations: Cell<usize>,
}

/// In-memory expression engine.
///
/// Variables are global to every context derived from the root; scoped
/// contexts add locals on top. Opaque expressions are evaluated by functions
/// registered under their source text.
pub struct TestResolver {
    id: ResolverId,
    shared: Rc<Shared>,
    locals: Vec<(Rc<str>, Value)>,
}

impl TestResolver {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            id: next_context_id(),
            shared: Rc::new(Shared::default()),
            locals: Vec::new(),
        })
    }

    pub fn context(self: &Rc<Self>) -> ResolverRef {
        self.clone()
    }

    /// Sets a variable and notifies every subscription that reads it.
    pub fn set_variable(&self, name: &str, value: impl Into<Value>) {
        self.shared
            .variables
            .borrow_mut()
            .insert(name.into(), value.into());
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .shared
            .watches
            .borrow()
            .values()
            .filter(|watch| watch.variables.iter().any(|var| var.as_ref() == name))
            .map(|watch| Rc::clone(&watch.callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    pub fn remove_variable(&self, name: &str) {
        self.shared.variables.borrow_mut().remove(name);
    }

    pub fn define_function(
        &self,
        source: &str,
        function: impl Fn(&Lookup<'_>) -> Result<Value, ResolutionError> + 'static,
    ) {
        self.shared
            .functions
            .borrow_mut()
            .insert(source.into(), Rc::new(function));
    }

    /// Registers `source` as reading `field` of the dictionary in `variable`.
    pub fn define_field(&self, source: &str, variable: &'static str, field: &'static str) {
        self.define_function(source, move |lookup| {
            Ok(lookup.get(variable)?.get(field).cloned().unwrap_or_default())
        });
    }

    pub fn live_subscriptions(&self) -> usize {
        self.shared.watches.borrow().len()
    }

    /// Names of the variables watched by live subscriptions.
    pub fn watched_variables(&self) -> Vec<Rc<str>> {
        let mut names: Vec<Rc<str>> = self
            .shared
            .watches
            .borrow()
            .values()
            .flat_map(|watch| watch.variables.iter().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn evaluation_count(&self) -> usize {
        self.shared.evaluations.get()
    }

    fn lookup(&self, name: &str) -> Result<Value, ResolutionError> {
        if let Some((_, value)) = self.locals.iter().rev().find(|(local, _)| local.as_ref() == name) {
            return Ok(value.clone());
        }
        self.shared
            .variables
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| ResolutionError::missing_variable(name))
    }

    fn is_local(&self, name: &str) -> bool {
        self.locals.iter().any(|(local, _)| local.as_ref() == name)
    }
}

impl ExpressionResolver for TestResolver {
    fn id(&self) -> ResolverId {
        self.id
    }

    fn evaluate(&self, expression: &Expression) -> Result<Value, ResolutionError> {
        self.shared.evaluations.set(self.shared.evaluations.get() + 1);
        match expression {
            Expression::Constant(value) => Ok(value.clone()),
            Expression::Variable(name) => self.lookup(name),
            Expression::Opaque { source, .. } => {
                let function = self.shared.functions.borrow().get(source).cloned();
                match function {
                    Some(function) => function(&Lookup { resolver: self }),
                    None => Err(ResolutionError::evaluation(
                        source.to_string(),
                        "no function registered",
                    )),
                }
            }
        }
    }

    fn subscribe(
        &self,
        expression: &Expression,
        callback: Rc<dyn Fn()>,
    ) -> Option<SubscriptionHandle> {
        let variables: Vec<Rc<str>> = expression
            .variables()
            .filter(|name| !self.is_local(name))
            .map(Rc::from)
            .collect();
        if variables.is_empty() {
            return None;
        }
        let handle = self.shared.next_handle.get() + 1;
        self.shared.next_handle.set(handle);
        self.shared
            .watches
            .borrow_mut()
            .insert(handle, Watch { variables, callback });
        Some(SubscriptionHandle(handle))
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.shared.watches.borrow_mut().remove(&handle.0);
    }

    fn scoped(&self, name: &str, value: Value) -> ResolverRef {
        let mut locals = self.locals.clone();
        locals.push((name.into(), value));
        Rc::new(TestResolver {
            id: next_context_id(),
            shared: Rc::clone(&self.shared),
            locals,
        })
    }
}
