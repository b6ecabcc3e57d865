//! Structural comparison of descriptor trees.
//!
//! Two trees are replaceable when a view built for one can be rebound to the
//! other by pushing leaf values only. Each side is resolved against its own
//! context, which matters for builder items whose scopes differ per element.

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use vista_core::{hash, Expression, ResolverRef, Value};

use super::descriptor::{DescriptorNode, ItemDescriptor, ItemKey, NodeChildren};
use super::item_source::build_items;
use super::patch::{self, ItemIdentity, PatchScript};

pub fn is_replaceable(
    old: &DescriptorNode,
    new: &DescriptorNode,
    old_context: &ResolverRef,
    new_context: &ResolverRef,
) -> bool {
    if std::ptr::eq(old, new) && old_context.id() == new_context.id() {
        return true;
    }
    if old.kind() != new.kind() {
        return false;
    }
    if let (Some(old_id), Some(new_id)) = (old.id(), new.id()) {
        if old_id != new_id {
            return false;
        }
    }
    same_structure(old, new, old_context, new_context)
        && same_children(old.children(), new.children(), old_context, new_context)
}

fn same_structure(
    old: &DescriptorNode,
    new: &DescriptorNode,
    old_context: &ResolverRef,
    new_context: &ResolverRef,
) -> bool {
    if old.structure().len() != new.structure().len() {
        return false;
    }
    old.structure().iter().all(|(name, old_expression)| {
        new.structure()
            .iter()
            .find(|(new_name, _)| new_name == name)
            .is_some_and(|(_, new_expression)| {
                same_value(old_expression, new_expression, old_context, new_context)
            })
    })
}

fn same_value(
    old: &Expression,
    new: &Expression,
    old_context: &ResolverRef,
    new_context: &ResolverRef,
) -> bool {
    match (old_context.evaluate(old), new_context.evaluate(new)) {
        (Ok(old_value), Ok(new_value)) => old_value == new_value,
        (Err(_), Err(_)) => true,
        _ => false,
    }
}

fn same_children(
    old: &NodeChildren,
    new: &NodeChildren,
    old_context: &ResolverRef,
    new_context: &ResolverRef,
) -> bool {
    if let (NodeChildren::Static(old_children), NodeChildren::Static(new_children)) = (old, new) {
        return old_children.len() == new_children.len()
            && old_children
                .iter()
                .zip(new_children)
                .all(|(old_child, new_child)| {
                    is_replaceable(old_child, new_child, old_context, new_context)
                });
    }

    match (expand(old, old_context), expand(new, new_context)) {
        (Some(old_items), Some(new_items)) => {
            old_items.len() == new_items.len()
                && old_items
                    .iter()
                    .zip(&new_items)
                    .all(|(old_item, new_item)| old_item.is_replaceable_with(new_item))
        }
        (None, None) => true,
        _ => false,
    }
}

/// Children as concrete items, each with the context it resolves against.
fn expand(children: &NodeChildren, context: &ResolverRef) -> Option<Vec<ItemDescriptor>> {
    match children {
        NodeChildren::Static(nodes) => Some(
            nodes
                .iter()
                .map(|node| ItemDescriptor::new(Rc::clone(node), context.clone()))
                .collect(),
        ),
        NodeChildren::Builder(builder) => match build_items(builder, context) {
            Ok(items) => Some(items.into_vec()),
            Err(err) => {
                log::debug!("builder children failed to resolve during comparison: {err}");
                None
            }
        },
    }
}

/// Digest of a tree's structure as resolved at one point in time.
///
/// Covers kinds, child ids, resolved structural values and expanded child
/// counts, never leaf values. The root id is left out, so views built for
/// one item can be pooled and reused for another of the same shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ShapeSignature(u64);

impl ShapeSignature {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for ShapeSignature {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Resolves the structural parts of `node` against `context` and digests
/// them. Failed resolutions hash to a fixed marker, matching
/// [`is_replaceable`] where two failures compare equal.
pub fn resolved_shape(node: &DescriptorNode, context: &ResolverRef) -> ShapeSignature {
    ShapeSignature(hash::digest(|hasher| {
        hash_resolved(node, context, false, hasher)
    }))
}

fn hash_resolved<H: Hasher>(
    node: &DescriptorNode,
    context: &ResolverRef,
    with_id: bool,
    state: &mut H,
) {
    node.kind().hash(state);
    if with_id {
        node.id().hash(state);
    }
    for (name, expression) in node.structure() {
        name.hash(state);
        match context.evaluate(expression) {
            Ok(value) => {
                state.write_u8(1);
                hash_value(&value, state);
            }
            Err(_) => state.write_u8(0),
        }
    }
    match node.children() {
        NodeChildren::Static(children) => {
            state.write_usize(children.len());
            for child in children {
                hash_resolved(child, context, true, state);
            }
        }
        NodeChildren::Builder(builder) => match build_items(builder, context) {
            Ok(items) => {
                state.write_usize(items.len());
                for item in items.iter() {
                    hash_resolved(item.node(), item.context(), true, state);
                }
            }
            Err(_) => state.write_usize(usize::MAX),
        },
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Null => {}
        Value::Bool(flag) => flag.hash(state),
        Value::Integer(number) => number.hash(state),
        // -0.0 == 0.0, so both hash as 0.0
        Value::Number(number) => {
            let number = if *number == 0.0 { 0.0 } else { *number };
            number.to_bits().hash(state)
        }
        Value::String(text) => text.hash(state),
        Value::Array(values) => {
            state.write_usize(values.len());
            for value in values.iter() {
                hash_value(value, state);
            }
        }
        Value::Dict(entries) => {
            state.write_usize(entries.len());
            for (key, value) in entries.iter() {
                key.hash(state);
                hash_value(value, state);
            }
        }
    }
}

/// Identity used by the adapter: caller keys plus structural compatibility.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralIdentity;

impl ItemIdentity<ItemDescriptor> for StructuralIdentity {
    fn key(&self, item: &ItemDescriptor) -> Option<ItemKey> {
        item.key().cloned()
    }

    fn is_compatible(&self, old: &ItemDescriptor, new: &ItemDescriptor) -> bool {
        old.is_replaceable_with(new)
    }
}

/// Produces the patch that turns one item sequence into another.
pub trait SequenceDiffer {
    fn diff(&self, old: &[ItemDescriptor], new: &[ItemDescriptor]) -> PatchScript<ItemDescriptor>;
}

impl<F> SequenceDiffer for F
where
    F: Fn(&[ItemDescriptor], &[ItemDescriptor]) -> PatchScript<ItemDescriptor>,
{
    fn diff(&self, old: &[ItemDescriptor], new: &[ItemDescriptor]) -> PatchScript<ItemDescriptor> {
        self(old, new)
    }
}

/// Keyed diff under [`StructuralIdentity`]; what adapters use by default.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyedDiffer;

impl SequenceDiffer for KeyedDiffer {
    fn diff(&self, old: &[ItemDescriptor], new: &[ItemDescriptor]) -> PatchScript<ItemDescriptor> {
        patch::diff(old, new, &StructuralIdentity)
    }
}
