//! Item resolution: from a declarative source to a concrete sequence.

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use vista_core::{hash, Expression, ResolutionError, ResolverRef, SubscriptionScope};

use super::descriptor::{DescriptorNode, ItemDescriptor, ItemKey, ItemSequence};

/// Default name the current data element is bound to in a builder scope.
pub const DEFAULT_DATA_ELEMENT_NAME: &str = "it";

/// A fixed item, shown unless its visibility resolves to `false`.
#[derive(Clone, Debug)]
pub struct StaticItem {
    pub node: Rc<DescriptorNode>,
    pub visibility: Option<Expression>,
}

impl StaticItem {
    pub fn new(node: impl Into<Rc<DescriptorNode>>) -> Self {
        Self {
            node: node.into(),
            visibility: None,
        }
    }

    pub fn visible_when(mut self, visibility: Expression) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

/// A template a builder can instantiate for one data element.
#[derive(Clone, Debug)]
pub struct Prototype {
    pub node: Rc<DescriptorNode>,
    /// Absent selector accepts every element.
    pub selector: Option<Expression>,
    /// Evaluated in the element scope to produce the item key.
    pub id: Option<Expression>,
}

impl Prototype {
    pub fn new(node: impl Into<Rc<DescriptorNode>>) -> Self {
        Self {
            node: node.into(),
            selector: None,
            id: None,
        }
    }

    pub fn with_selector(mut self, selector: Expression) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn with_id(mut self, id: Expression) -> Self {
        self.id = Some(id);
        self
    }
}

/// Generates one item per element of a data array.
#[derive(Clone, Debug)]
pub struct ItemBuilder {
    pub data: Expression,
    pub data_element_name: Rc<str>,
    pub prototypes: Vec<Prototype>,
}

impl ItemBuilder {
    pub fn new(data: Expression) -> Self {
        Self {
            data,
            data_element_name: DEFAULT_DATA_ELEMENT_NAME.into(),
            prototypes: Vec::new(),
        }
    }

    pub fn element_name(mut self, name: impl Into<Rc<str>>) -> Self {
        self.data_element_name = name.into();
        self
    }

    pub fn prototype(mut self, prototype: Prototype) -> Self {
        self.prototypes.push(prototype);
        self
    }

    pub(crate) fn hash_shape<H: Hasher>(&self, state: &mut H) {
        self.data.to_string().hash(state);
        self.data_element_name.hash(state);
        for prototype in &self.prototypes {
            prototype.node.hash_shape(state);
            prototype.selector.as_ref().map(ToString::to_string).hash(state);
        }
    }
}

#[derive(Clone, Debug)]
pub enum ItemSource {
    Static(Vec<StaticItem>),
    Builder(Rc<ItemBuilder>),
}

impl ItemSource {
    pub fn from_nodes<I, N>(nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Rc<DescriptorNode>>,
    {
        ItemSource::Static(nodes.into_iter().map(StaticItem::new).collect())
    }

    pub fn shape_hash(&self) -> u64 {
        hash::digest(|hasher| match self {
            ItemSource::Static(items) => {
                hasher.write_usize(items.len());
                for item in items {
                    item.node.hash_shape(hasher);
                }
            }
            ItemSource::Builder(builder) => builder.hash_shape(hasher),
        })
    }
}

impl From<ItemBuilder> for ItemSource {
    fn from(builder: ItemBuilder) -> Self {
        ItemSource::Builder(Rc::new(builder))
    }
}

/// Resolves `source` against `context` into a fresh sequence.
///
/// Engine errors propagate unchanged and are never retried.
pub fn resolve_items(
    source: &ItemSource,
    context: &ResolverRef,
) -> Result<ItemSequence, ResolutionError> {
    match source {
        ItemSource::Static(items) => {
            let mut resolved = Vec::with_capacity(items.len());
            for item in items {
                if let Some(visibility) = &item.visibility {
                    if !context.evaluate_bool(visibility)? {
                        continue;
                    }
                }
                resolved.push(ItemDescriptor::new(item.node.clone(), context.clone()));
            }
            Ok(ItemSequence::new(resolved))
        }
        ItemSource::Builder(builder) => build_items(builder, context),
    }
}

/// Instantiates `builder` once per data element, each in its own scope.
pub fn build_items(
    builder: &ItemBuilder,
    context: &ResolverRef,
) -> Result<ItemSequence, ResolutionError> {
    let data = context.evaluate(&builder.data)?;
    let elements = data
        .as_array()
        .ok_or_else(|| ResolutionError::type_mismatch("array", data.type_name()))?;

    let mut items = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let scope = context.scoped(&builder.data_element_name, element.clone());
        let Some(prototype) = select_prototype(builder, &scope)? else {
            log::debug!("no prototype accepts data element {index}; skipping");
            continue;
        };
        let key = match &prototype.id {
            Some(id) => ItemKey::try_from_value(&scope.evaluate(id)?),
            None => prototype.node.id().map(ItemKey::from),
        };
        items.push(ItemDescriptor::new(prototype.node.clone(), scope).with_key(key));
    }
    Ok(ItemSequence::new(items))
}

fn select_prototype<'a>(
    builder: &'a ItemBuilder,
    scope: &ResolverRef,
) -> Result<Option<&'a Prototype>, ResolutionError> {
    for prototype in &builder.prototypes {
        let accepted = match &prototype.selector {
            Some(selector) => scope.evaluate_bool(selector)?,
            None => true,
        };
        if accepted {
            return Ok(Some(prototype));
        }
    }
    Ok(None)
}

/// Subscribes `callback` to every variable that can change the resolved
/// sequence of `source`.
///
/// Variables bound by the builder's element scope are left out; what they
/// read lives in the data array, which is subscribed as a whole.
pub fn subscribe_source(
    source: &ItemSource,
    context: &ResolverRef,
    callback: Rc<dyn Fn()>,
) -> SubscriptionScope {
    let mut scope = SubscriptionScope::new();
    match source {
        ItemSource::Static(items) => {
            for visibility in items.iter().filter_map(|item| item.visibility.as_ref()) {
                scope.observe(context, visibility, callback.clone());
            }
        }
        ItemSource::Builder(builder) => {
            scope.observe(context, &builder.data, callback.clone());
            let element_name = builder.data_element_name.as_ref();
            let per_element = builder
                .prototypes
                .iter()
                .flat_map(|prototype| prototype.selector.iter().chain(prototype.id.iter()));
            for expression in per_element {
                if let Some(outer) = without_variable(expression, element_name) {
                    scope.observe(context, &outer, callback.clone());
                }
            }
        }
    }
    scope
}

fn without_variable(expression: &Expression, name: &str) -> Option<Expression> {
    let outer: Vec<&str> = expression.variables().filter(|var| *var != name).collect();
    if outer.is_empty() {
        return None;
    }
    Some(Expression::opaque(expression.to_string(), outer))
}
