use std::rc::Rc;

use proptest::prelude::*;
use vista_core::Expression;
use vista_foundation::{
    diff, resolve_items, DescriptorNode, ItemIdentity, ItemKey, ItemSource, PatchOp, PatchOpKind,
    StructuralIdentity,
};
use vista_testing::{card, TestResolver};

/// Plain numbers keyed by value.
struct ByValue;

impl ItemIdentity<u32> for ByValue {
    fn key(&self, item: &u32) -> Option<ItemKey> {
        Some(ItemKey::from(u64::from(*item)))
    }

    fn is_compatible(&self, old: &u32, new: &u32) -> bool {
        old == new
    }
}

/// `(key, shape)` pairs; items without a key force the positional path.
struct Unkeyed;

impl ItemIdentity<(Option<u32>, u8)> for Unkeyed {
    fn key(&self, item: &(Option<u32>, u8)) -> Option<ItemKey> {
        item.0.map(|key| ItemKey::from(u64::from(key)))
    }

    fn is_compatible(&self, old: &(Option<u32>, u8), new: &(Option<u32>, u8)) -> bool {
        old == new
    }
}

fn keyed_sequence() -> impl Strategy<Value = Vec<u32>> {
    proptest::sample::subsequence((0u32..24).collect::<Vec<_>>(), 0..=24).prop_shuffle()
}

proptest! {
    #[test]
    fn applying_the_diff_yields_the_new_sequence(old in keyed_sequence(), new in keyed_sequence()) {
        let script = diff(&old, &new, &ByValue);
        prop_assert!(script.is_keyed());

        let removed = old.iter().filter(|item| !new.contains(item)).count();
        let inserted = new.iter().filter(|item| !old.contains(item)).count();
        prop_assert_eq!(script.count(PatchOpKind::Remove), removed);
        prop_assert_eq!(script.count(PatchOpKind::Insert), inserted);

        let mut applied = old.clone();
        script.apply_to(&mut applied).unwrap();
        prop_assert_eq!(applied, new);
    }

    #[test]
    fn positional_fallback_round_trips(
        old in proptest::collection::vec((Just(None::<u32>), 0u8..3), 0..12),
        new in proptest::collection::vec((Just(None::<u32>), 0u8..3), 0..12),
    ) {
        let script = diff(&old, &new, &Unkeyed);
        prop_assert!(!script.is_keyed());
        prop_assert_eq!(script.count(PatchOpKind::Move), 0);

        let mut applied = old.clone();
        script.apply_to(&mut applied).unwrap();
        prop_assert_eq!(applied, new);
    }

    #[test]
    fn diff_of_a_sequence_with_itself_is_empty(items in keyed_sequence()) {
        prop_assert!(diff(&items, &items, &ByValue).is_empty());
    }
}

#[test]
fn swapping_two_items_is_one_move() {
    let script = diff::<u32, _>(&[1, 2, 3], &[1, 3, 2], &ByValue);
    assert_eq!(script.ops(), &[PatchOp::Move { from: 1, to: 2 }]);
}

#[test]
fn moving_the_last_item_first_keeps_the_rest() {
    let script = diff::<u32, _>(&[1, 2, 3, 4], &[4, 1, 2, 3], &ByValue);
    assert_eq!(script.ops(), &[PatchOp::Move { from: 3, to: 0 }]);
}

#[test]
fn missing_key_falls_back_to_positions() {
    let old: Vec<(Option<u32>, u8)> = vec![(Some(1), 0), (None, 0)];
    let new: Vec<(Option<u32>, u8)> = vec![(Some(1), 0), (None, 1)];
    let script = diff(&old, &new, &Unkeyed);
    assert!(!script.is_keyed());
    assert_eq!(
        script.ops(),
        &[
            PatchOp::Remove { index: 1, key: None },
            PatchOp::Insert {
                index: 1,
                item: (None, 1),
            },
        ]
    );
}

#[test]
fn descriptor_sequences_diff_by_key() {
    let resolver = TestResolver::new();
    let context = resolver.context();
    let nodes: Vec<Rc<DescriptorNode>> = ["1", "2", "3"]
        .iter()
        .map(|id| Rc::new(card(id, Expression::constant(*id))))
        .collect();
    let source = |order: &[usize]| {
        ItemSource::from_nodes(order.iter().map(|at| Rc::clone(&nodes[*at])))
    };

    let old = resolve_items(&source(&[0, 1, 2]), &context).unwrap();
    let swapped = resolve_items(&source(&[0, 2, 1]), &context).unwrap();
    let script = diff(old.as_slice(), swapped.as_slice(), &StructuralIdentity);
    assert_eq!(script.len(), 1);
    assert_eq!(script.count(PatchOpKind::Move), 1);

    let replaced = resolve_items(
        &ItemSource::from_nodes([
            Rc::clone(&nodes[0]),
            Rc::new(card("3", Expression::constant("C"))),
        ]),
        &context,
    )
    .unwrap();
    let old = resolve_items(&source(&[0, 1]), &context).unwrap();
    let script = diff(old.as_slice(), replaced.as_slice(), &StructuralIdentity);
    match script.ops() {
        [PatchOp::Remove { index: 1, key }, PatchOp::Insert { index: 1, item }] => {
            assert_eq!(key.as_ref(), Some(&ItemKey::from("2")));
            assert_eq!(item.key(), Some(&ItemKey::from("3")));
        }
        ops => panic!("unexpected ops: {ops:?}"),
    }
}
