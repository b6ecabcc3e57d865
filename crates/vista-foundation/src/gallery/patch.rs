//! Edit scripts between two versions of an item sequence.
//!
//! With stable keys the script is Removes (descending), then Moves, then
//! Inserts (ascending). Survivors on the longest run already in new order
//! stay put; every other survivor moves, in ascending target order, to
//! directly after its predecessor. Without usable keys the diff falls back
//! to positional Remove + Insert pairs.

use std::fmt;

use vista_core::collections::map::{HashMap, HashSet};

use super::descriptor::ItemKey;
use super::error::PatchInconsistencyError;

/// How the patch engine tells items apart across versions.
pub trait ItemIdentity<T> {
    fn key(&self, item: &T) -> Option<ItemKey>;

    /// Whether `new` may take over the position of `old` without a rebuild.
    /// Only consulted by the positional fallback.
    fn is_compatible(&self, old: &T, new: &T) -> bool;
}

#[derive(Clone, Debug, PartialEq)]
pub enum PatchOp<T> {
    Insert { index: usize, item: T },
    Remove { index: usize, key: Option<ItemKey> },
    /// Remove at `from`, then insert at `to` in the shortened sequence.
    Move { from: usize, to: usize },
}

impl<T> PatchOp<T> {
    pub fn kind(&self) -> PatchOpKind {
        match self {
            PatchOp::Insert { .. } => PatchOpKind::Insert,
            PatchOp::Remove { .. } => PatchOpKind::Remove,
            PatchOp::Move { .. } => PatchOpKind::Move,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PatchOpKind {
    Insert,
    Remove,
    Move,
}

impl fmt::Display for PatchOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PatchOpKind::Insert => "insert",
            PatchOpKind::Remove => "remove",
            PatchOpKind::Move => "move",
        })
    }
}

/// Ordered ops that turn the old sequence into the new one.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchScript<T> {
    ops: Vec<PatchOp<T>>,
    keyed: bool,
}

impl<T> PatchScript<T> {
    pub fn new(ops: Vec<PatchOp<T>>, keyed: bool) -> Self {
        Self { ops, keyed }
    }

    pub fn ops(&self) -> &[PatchOp<T>] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<PatchOp<T>> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// False when the diff fell back to positional matching.
    pub fn is_keyed(&self) -> bool {
        self.keyed
    }

    pub fn count(&self, kind: PatchOpKind) -> usize {
        self.ops.iter().filter(|op| op.kind() == kind).count()
    }

    /// Checks every op against the length the sequence will have when the
    /// op is reached, starting from `len`.
    pub fn validate(&self, len: usize) -> Result<(), PatchInconsistencyError> {
        let mut len = len;
        for (op_index, op) in self.ops.iter().enumerate() {
            let (index, in_bounds) = match *op {
                PatchOp::Insert { index, .. } => (index, index <= len),
                PatchOp::Remove { index, .. } => (index, index < len),
                PatchOp::Move { from, to } => {
                    if from >= len {
                        (from, false)
                    } else {
                        (to, to < len)
                    }
                }
            };
            if !in_bounds {
                return Err(PatchInconsistencyError {
                    op_index,
                    op: op.kind(),
                    index,
                    len,
                });
            }
            match op {
                PatchOp::Insert { .. } => len += 1,
                PatchOp::Remove { .. } => len -= 1,
                PatchOp::Move { .. } => {}
            }
        }
        Ok(())
    }

    /// Applies the script to `target`. Nothing is touched when any op is out
    /// of bounds.
    pub fn apply_to(self, target: &mut Vec<T>) -> Result<(), PatchInconsistencyError> {
        self.validate(target.len())?;
        for op in self.ops {
            match op {
                PatchOp::Insert { index, item } => target.insert(index, item),
                PatchOp::Remove { index, .. } => {
                    target.remove(index);
                }
                PatchOp::Move { from, to } => {
                    let item = target.remove(from);
                    target.insert(to, item);
                }
            }
        }
        Ok(())
    }
}

/// Computes the script that turns `old` into `new`.
pub fn diff<T, I>(old: &[T], new: &[T], identity: &I) -> PatchScript<T>
where
    T: Clone,
    I: ItemIdentity<T> + ?Sized,
{
    match (unique_keys(old, identity), unique_keys(new, identity)) {
        (Some(old_keys), Some(new_keys)) => keyed_diff(&old_keys, &new_keys, new),
        _ => positional_diff(old, new, identity),
    }
}

fn unique_keys<T, I>(items: &[T], identity: &I) -> Option<Vec<ItemKey>>
where
    I: ItemIdentity<T> + ?Sized,
{
    let mut seen = HashSet::default();
    let mut keys = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Some(key) = identity.key(item) else {
            log::debug!("item {index} has no key; using positional diff");
            return None;
        };
        if !seen.insert(key.clone()) {
            log::warn!("duplicate item key {key} at {index}; using positional diff");
            return None;
        }
        keys.push(key);
    }
    Some(keys)
}

fn keyed_diff<T: Clone>(old_keys: &[ItemKey], new_keys: &[ItemKey], new: &[T]) -> PatchScript<T> {
    let old_set: HashSet<&ItemKey> = old_keys.iter().collect();
    let new_set: HashSet<&ItemKey> = new_keys.iter().collect();
    let mut ops = Vec::new();

    for (index, key) in old_keys.iter().enumerate().rev() {
        if !new_set.contains(key) {
            ops.push(PatchOp::Remove {
                index,
                key: Some(key.clone()),
            });
        }
    }

    // Rank = position among the survivors in new order.
    let ranks: HashMap<&ItemKey, usize> = new_keys
        .iter()
        .filter(|key| old_set.contains(key))
        .enumerate()
        .map(|(rank, key)| (key, rank))
        .collect();
    let mut order: Vec<usize> = old_keys
        .iter()
        .filter_map(|key| ranks.get(key).copied())
        .collect();

    let stable = longest_increasing_run(&order);
    for rank in 0..order.len() {
        if stable[rank] {
            continue;
        }
        let Some(from) = order.iter().position(|r| *r == rank) else {
            continue;
        };
        order.remove(from);
        let to = match rank.checked_sub(1) {
            Some(previous) => order
                .iter()
                .position(|r| *r == previous)
                .map_or(0, |at| at + 1),
            None => 0,
        };
        order.insert(to, rank);
        if from != to {
            ops.push(PatchOp::Move { from, to });
        }
    }

    for (index, key) in new_keys.iter().enumerate() {
        if !old_set.contains(key) {
            ops.push(PatchOp::Insert {
                index,
                item: new[index].clone(),
            });
        }
    }

    PatchScript::new(ops, true)
}

/// Marks, by rank, the members of one longest increasing run of `ranks`
/// (a permutation of `0..ranks.len()`).
///
/// Patience sorting; among runs of equal length the one ending at the
/// smallest rank wins.
fn longest_increasing_run(ranks: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; ranks.len()];
    for (at, &rank) in ranks.iter().enumerate() {
        let pile = tails.partition_point(|&tail| ranks[tail] < rank);
        if pile > 0 {
            previous[at] = Some(tails[pile - 1]);
        }
        if pile == tails.len() {
            tails.push(at);
        } else {
            tails[pile] = at;
        }
    }

    let mut stable = vec![false; ranks.len()];
    let mut cursor = tails.last().copied();
    while let Some(at) = cursor {
        stable[ranks[at]] = true;
        cursor = previous[at];
    }
    stable
}

fn positional_diff<T, I>(old: &[T], new: &[T], identity: &I) -> PatchScript<T>
where
    T: Clone,
    I: ItemIdentity<T> + ?Sized,
{
    let common = old.len().min(new.len());
    let changed: Vec<bool> = (0..common)
        .map(|index| !identity.is_compatible(&old[index], &new[index]))
        .collect();
    let differs = |index: usize| index >= common || changed[index];

    let mut ops = Vec::new();
    for index in (0..old.len()).rev().filter(|&index| differs(index)) {
        ops.push(PatchOp::Remove {
            index,
            key: identity.key(&old[index]),
        });
    }
    for index in (0..new.len()).filter(|&index| differs(index)) {
        ops.push(PatchOp::Insert {
            index,
            item: new[index].clone(),
        });
    }
    PatchScript::new(ops, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Items are `(key, shape)`; equal shapes are compatible.
    struct Keyed;

    impl ItemIdentity<(&'static str, u8)> for Keyed {
        fn key(&self, item: &(&'static str, u8)) -> Option<ItemKey> {
            (!item.0.is_empty()).then(|| ItemKey::from(item.0))
        }

        fn is_compatible(&self, old: &(&'static str, u8), new: &(&'static str, u8)) -> bool {
            old.1 == new.1
        }
    }

    fn keyed(keys: &[&'static str]) -> Vec<(&'static str, u8)> {
        keys.iter().map(|key| (*key, 0)).collect()
    }

    fn round_trip(old: Vec<(&'static str, u8)>, new: &[(&'static str, u8)]) {
        let script = diff(&old, new, &Keyed);
        let mut applied = old;
        script.apply_to(&mut applied).expect("script in bounds");
        assert_eq!(applied, new);
    }

    #[test]
    fn swap_is_a_single_move() {
        let old = keyed(&["1", "2", "3"]);
        let new = keyed(&["1", "3", "2"]);
        let script = diff(&old, &new, &Keyed);
        assert!(script.is_keyed());
        assert_eq!(script.ops(), &[PatchOp::Move { from: 1, to: 2 }]);
        round_trip(old, &new);
    }

    #[test]
    fn replaced_key_is_remove_then_insert() {
        let old = keyed(&["1", "2"]);
        let new = keyed(&["1", "3"]);
        let script = diff(&old, &new, &Keyed);
        assert_eq!(
            script.ops(),
            &[
                PatchOp::Remove {
                    index: 1,
                    key: Some(ItemKey::from("2")),
                },
                PatchOp::Insert {
                    index: 1,
                    item: ("3", 0),
                },
            ]
        );
    }

    #[test]
    fn removes_descend_and_inserts_ascend() {
        let old = keyed(&["a", "b", "c", "d"]);
        let new = keyed(&["x", "b", "y", "d", "z"]);
        let script = diff(&old, &new, &Keyed);
        let removes: Vec<usize> = script
            .ops()
            .iter()
            .filter_map(|op| match op {
                PatchOp::Remove { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        let inserts: Vec<usize> = script
            .ops()
            .iter()
            .filter_map(|op| match op {
                PatchOp::Insert { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(removes, vec![2, 0]);
        assert_eq!(inserts, vec![0, 2, 4]);
        assert_eq!(script.count(PatchOpKind::Move), 0);
        round_trip(old, &new);
    }

    #[test]
    fn reversal_keeps_one_item_in_place() {
        let old = keyed(&["a", "b", "c", "d", "e"]);
        let new = keyed(&["e", "d", "c", "b", "a"]);
        let script = diff(&old, &new, &Keyed);
        assert_eq!(script.count(PatchOpKind::Move), 4);
        round_trip(old, &new);
    }

    #[test]
    fn identical_sequences_produce_nothing() {
        let old = keyed(&["a", "b", "c"]);
        assert!(diff(&old, &old, &Keyed).is_empty());
        let unkeyed = vec![("", 1), ("", 2)];
        assert!(diff(&unkeyed, &unkeyed, &Keyed).is_empty());
    }

    #[test]
    fn duplicate_keys_fall_back_to_positions() {
        let old = vec![("a", 0), ("a", 1), ("b", 2)];
        let new = vec![("a", 0), ("a", 3), ("b", 2)];
        let script = diff(&old, &new, &Keyed);
        assert!(!script.is_keyed());
        assert_eq!(script.count(PatchOpKind::Remove), 1);
        assert_eq!(script.count(PatchOpKind::Insert), 1);
        round_trip(old, &new);
    }

    #[test]
    fn validate_rejects_out_of_bounds_ops() {
        let script: PatchScript<u8> = PatchScript::new(
            vec![
                PatchOp::Remove { index: 1, key: None },
                PatchOp::Move { from: 0, to: 1 },
            ],
            true,
        );
        let err = script.validate(2).unwrap_err();
        assert_eq!(err.op_index, 1);
        assert_eq!(err.op, PatchOpKind::Move);
        assert_eq!(err.len, 1);

        let mut target = vec![1u8, 2];
        assert!(script.apply_to(&mut target).is_err());
        assert_eq!(target, vec![1, 2]);
    }
}
