//! Normalized declarative trees and the items built from them.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

use smallvec::SmallVec;
use vista_core::{hash, Expression, ResolverRef, Value};

use super::comparator;
use super::item_source::ItemBuilder;

/// Kind tag of a declarative node (`"text"`, `"container"`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeKind(Rc<str>);

impl NodeKind {
    pub fn new(kind: impl Into<Rc<str>>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identity of an item across versions of a sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(Rc<str>);

impl ItemKey {
    pub fn new(key: impl Into<Rc<str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Keys can be strings or whole numbers; anything else has no identity.
    pub fn try_from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(key) => Some(Self(key.clone())),
            Value::Integer(_) | Value::Number(_) => value.as_integer().map(Self::from),
            _ => None,
        }
    }
}

impl From<&str> for ItemKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ItemKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl From<i64> for ItemKey {
    fn from(key: i64) -> Self {
        Self::new(key.to_string())
    }
}

impl From<u64> for ItemKey {
    fn from(key: u64) -> Self {
        Self::new(key.to_string())
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type Fields = SmallVec<[(Rc<str>, Expression); 2]>;

#[derive(Clone, Debug)]
pub enum NodeChildren {
    Static(Vec<Rc<DescriptorNode>>),
    /// Children generated from data, resolved against the parent's context.
    Builder(Rc<ItemBuilder>),
}

impl Default for NodeChildren {
    fn default() -> Self {
        NodeChildren::Static(Vec::new())
    }
}

/// One node of a declarative tree.
///
/// Structural fields take part in replaceability (their resolved values must
/// match); leaf properties never do and are only pushed into the view.
#[derive(Clone, Debug)]
pub struct DescriptorNode {
    kind: NodeKind,
    id: Option<Rc<str>>,
    structure: Fields,
    properties: Fields,
    children: NodeChildren,
}

impl DescriptorNode {
    pub fn new(kind: impl Into<Rc<str>>) -> Self {
        Self {
            kind: NodeKind::new(kind),
            id: None,
            structure: SmallVec::new(),
            properties: SmallVec::new(),
            children: NodeChildren::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<Rc<str>>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn structural(mut self, name: impl Into<Rc<str>>, value: impl Into<Expression>) -> Self {
        self.structure.push((name.into(), value.into()));
        self
    }

    pub fn property(mut self, name: impl Into<Rc<str>>, value: impl Into<Expression>) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }

    /// Appends a static child. Replaces builder children if any were set.
    pub fn child(mut self, child: impl Into<Rc<DescriptorNode>>) -> Self {
        let child = child.into();
        if let NodeChildren::Static(children) = &mut self.children {
            children.push(child);
        } else {
            self.children = NodeChildren::Static(vec![child]);
        }
        self
    }

    pub fn children_builder(mut self, builder: impl Into<Rc<ItemBuilder>>) -> Self {
        self.children = NodeChildren::Builder(builder.into());
        self
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn structure(&self) -> &[(Rc<str>, Expression)] {
        &self.structure
    }

    pub fn properties(&self) -> &[(Rc<str>, Expression)] {
        &self.properties
    }

    pub fn children(&self) -> &NodeChildren {
        &self.children
    }

    /// Hash of kinds, ids, structural fields and nesting. Leaf properties
    /// are left out, so two nodes that differ only in leaf values agree.
    pub fn shape_hash(&self) -> u64 {
        hash::digest(|hasher| self.hash_shape(hasher))
    }

    pub(crate) fn hash_shape<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.id.hash(state);
        for (name, expression) in &self.structure {
            name.hash(state);
            expression.to_string().hash(state);
        }
        match &self.children {
            NodeChildren::Static(children) => {
                state.write_usize(children.len());
                for child in children {
                    child.hash_shape(state);
                }
            }
            NodeChildren::Builder(builder) => builder.hash_shape(state),
        }
    }
}

/// A node plus the context it binds against.
#[derive(Clone)]
pub struct ItemDescriptor {
    node: Rc<DescriptorNode>,
    context: ResolverRef,
    key: Option<ItemKey>,
}

impl ItemDescriptor {
    pub fn new(node: Rc<DescriptorNode>, context: ResolverRef) -> Self {
        let key = node.id().map(ItemKey::from);
        Self { node, context, key }
    }

    pub fn with_key(mut self, key: Option<ItemKey>) -> Self {
        self.key = key;
        self
    }

    pub fn node(&self) -> &Rc<DescriptorNode> {
        &self.node
    }

    pub fn context(&self) -> &ResolverRef {
        &self.context
    }

    pub fn key(&self) -> Option<&ItemKey> {
        self.key.as_ref()
    }

    /// Same node instance bound against the same context.
    pub fn same_binding(&self, other: &ItemDescriptor) -> bool {
        Rc::ptr_eq(&self.node, &other.node) && self.context.id() == other.context.id()
    }

    /// Structure of this item under its own context, as of now.
    pub fn resolved_shape(&self) -> comparator::ShapeSignature {
        comparator::resolved_shape(&self.node, &self.context)
    }

    pub fn is_replaceable_with(&self, other: &ItemDescriptor) -> bool {
        comparator::is_replaceable(&self.node, &other.node, &self.context, &other.context)
    }
}

impl fmt::Debug for ItemDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemDescriptor")
            .field("kind", self.node.kind())
            .field("key", &self.key)
            .field("context", &self.context.id())
            .finish()
    }
}

/// Ordered, immutable result of resolving an item source.
#[derive(Clone, Debug, Default)]
pub struct ItemSequence(Vec<ItemDescriptor>);

impl ItemSequence {
    pub fn new(items: Vec<ItemDescriptor>) -> Self {
        Self(items)
    }

    pub fn as_slice(&self) -> &[ItemDescriptor] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<ItemDescriptor> {
        self.0
    }

    pub fn index_of_key(&self, key: &ItemKey) -> Option<usize> {
        self.0.iter().position(|item| item.key() == Some(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = Option<&ItemKey>> + '_ {
        self.0.iter().map(ItemDescriptor::key)
    }
}

impl Deref for ItemSequence {
    type Target = [ItemDescriptor];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<ItemDescriptor> for ItemSequence {
    fn from_iter<I: IntoIterator<Item = ItemDescriptor>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ItemSequence {
    type Item = ItemDescriptor;
    type IntoIter = std::vec::IntoIter<ItemDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
