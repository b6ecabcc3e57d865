//! Interface to the external expression engine.
//!
//! Vista never parses or evaluates expressions itself. It only needs to know
//! which variables an expression reads (to subscribe to them) and to hand the
//! expression to an [`ExpressionResolver`] for evaluation.

use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::ResolutionError;
use crate::value::Value;

/// A data-bound value as it appears in a declarative tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// Already resolved; never changes and needs no subscription.
    Constant(Value),
    /// Reads a single variable.
    Variable(Rc<str>),
    /// Engine-defined source text plus the variables it references.
    Opaque {
        source: Rc<str>,
        variables: SmallVec<[Rc<str>; 2]>,
    },
}

impl Expression {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant(value.into())
    }

    pub fn variable(name: impl Into<Rc<str>>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn opaque<I, S>(source: impl Into<Rc<str>>, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Rc<str>>,
    {
        Expression::Opaque {
            source: source.into(),
            variables: variables.into_iter().map(Into::into).collect(),
        }
    }

    /// Names of the variables this expression reads.
    pub fn variables(&self) -> impl Iterator<Item = &str> + '_ {
        let (single, many): (Option<&Rc<str>>, &[Rc<str>]) = match self {
            Expression::Constant(_) => (None, &[]),
            Expression::Variable(name) => (Some(name), &[]),
            Expression::Opaque { variables, .. } => (None, variables.as_slice()),
        };
        single.into_iter().chain(many.iter()).map(|name| name.as_ref())
    }

    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Constant(_) => true,
            Expression::Variable(_) => false,
            Expression::Opaque { variables, .. } => variables.is_empty(),
        }
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Constant(value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(value) => write!(f, "{value}"),
            Expression::Variable(name) => write!(f, "@{{{name}}}"),
            Expression::Opaque { source, .. } => f.write_str(source),
        }
    }
}

/// Identity of a resolver context.
///
/// Scoped contexts get their own id, which lets callers tell "same tree bound
/// against the same context" apart from "same tree, different element".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolverId(pub u64);

/// Handle returned by [`ExpressionResolver::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(pub u64);

/// Shared handle to a resolver context.
pub type ResolverRef = Rc<dyn ExpressionResolver>;

/// The expression engine as seen by the gallery engine.
///
/// All calls happen on the UI thread. `subscribe` callbacks may fire
/// synchronously from inside a variable update, so they must not assume any
/// particular call stack.
pub trait ExpressionResolver {
    fn id(&self) -> ResolverId;

    fn evaluate(&self, expression: &Expression) -> Result<Value, ResolutionError>;

    /// Registers `callback` to run whenever a variable read by `expression`
    /// changes. Returns `None` when the expression reads no variables.
    fn subscribe(
        &self,
        expression: &Expression,
        callback: Rc<dyn Fn()>,
    ) -> Option<SubscriptionHandle>;

    fn unsubscribe(&self, handle: SubscriptionHandle);

    /// Creates a child context where `name` is bound to `value`.
    fn scoped(&self, name: &str, value: Value) -> ResolverRef;

    fn evaluate_bool(&self, expression: &Expression) -> Result<bool, ResolutionError> {
        let value = self.evaluate(expression)?;
        value
            .as_bool()
            .ok_or_else(|| ResolutionError::type_mismatch("boolean", value.type_name()))
    }

    fn evaluate_integer(&self, expression: &Expression) -> Result<i64, ResolutionError> {
        let value = self.evaluate(expression)?;
        value
            .as_integer()
            .ok_or_else(|| ResolutionError::type_mismatch("integer", value.type_name()))
    }

    fn evaluate_string(&self, expression: &Expression) -> Result<Rc<str>, ResolutionError> {
        match self.evaluate(expression)? {
            Value::String(value) => Ok(value),
            other => Err(ResolutionError::type_mismatch("string", other.type_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_of_each_form() {
        assert_eq!(Expression::constant(1).variables().count(), 0);
        assert_eq!(
            Expression::variable("title").variables().collect::<Vec<_>>(),
            vec!["title"]
        );
        let opaque = Expression::opaque("@{a} + @{b}", ["a", "b"]);
        assert_eq!(opaque.variables().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(!opaque.is_constant());
        assert!(Expression::opaque("1 + 2", Vec::<&str>::new()).is_constant());
    }
}
