//! Scroll position records shared across gallery rebinds.
//!
//! [`ScrollStateStore`] is a cheap-clone handle to one keyed map. It is
//! created by the host and handed to every adapter that should share
//! positions, so tests can use an isolated instance.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::descriptor::ItemKey;

/// Stable identity of a logical collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionId(Rc<str>);

impl CollectionId {
    /// Identity taken from an explicit gallery id.
    pub fn explicit(id: impl Into<Rc<str>>) -> Self {
        Self(id.into())
    }

    /// Identity derived from the structural hash of an anonymous gallery.
    ///
    /// The hash is only stable for one build of the hasher, so galleries
    /// whose positions outlive the process should carry an explicit id.
    pub fn from_shape(shape_hash: u64) -> Self {
        Self(format!("#{shape_hash:016x}").into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CollectionId {
    fn from(id: &str) -> Self {
        Self::explicit(id)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First visible item and the pixel offset into it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollStateRecord {
    pub index: usize,
    pub offset: i32,
}

impl ScrollStateRecord {
    pub fn new(index: usize, offset: i32) -> Self {
        Self { index, offset }
    }
}

#[derive(Clone, Default)]
pub struct ScrollStateStore {
    inner: Rc<RefCell<IndexMap<CollectionId, ScrollStateRecord>>>,
}

impl ScrollStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, id: &CollectionId, index: usize, offset: i32) {
        log::trace!("saving scroll state of {id}: ({index}, {offset})");
        self.inner
            .borrow_mut()
            .insert(id.clone(), ScrollStateRecord::new(index, offset));
    }

    /// Stored record, or `(0, 0)` when there is none.
    pub fn load(&self, id: &CollectionId) -> ScrollStateRecord {
        self.get(id).unwrap_or_default()
    }

    pub fn get(&self, id: &CollectionId) -> Option<ScrollStateRecord> {
        self.inner.borrow().get(id).copied()
    }

    pub fn contains(&self, id: &CollectionId) -> bool {
        self.inner.borrow().contains_key(id)
    }

    pub fn evict(&self, id: &CollectionId) -> Option<ScrollStateRecord> {
        self.inner.borrow_mut().shift_remove(id)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }

    /// Copy of every record keyed by collection id, in insertion order.
    pub fn snapshot(&self) -> IndexMap<String, ScrollStateRecord> {
        self.inner
            .borrow()
            .iter()
            .map(|(id, record)| (id.as_str().to_owned(), *record))
            .collect()
    }

    /// Merges `records` into the store, overwriting existing ids.
    pub fn restore(&self, records: IndexMap<String, ScrollStateRecord>) {
        let mut inner = self.inner.borrow_mut();
        for (id, record) in records {
            inner.insert(CollectionId::explicit(id), record);
        }
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.snapshot())
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let store = Self::new();
        store.restore(serde_json::from_str(json)?);
        Ok(store)
    }
}

impl fmt::Debug for ScrollStateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.inner.borrow().iter()).finish()
    }
}

/// Live scroll position of one adapter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScrollPosition {
    pub index: usize,
    pub offset: i32,
    /// Key of the first visible item, used to follow it across patches.
    pub anchor_key: Option<ItemKey>,
}

impl ScrollPosition {
    pub fn new(index: usize, offset: i32) -> Self {
        Self {
            index,
            offset,
            anchor_key: None,
        }
    }

    pub fn record(&self) -> ScrollStateRecord {
        ScrollStateRecord::new(self.index, self.offset)
    }

    /// Moves the position to wherever the anchor item went.
    ///
    /// Without an anchor, or when the anchor item is gone, the index is
    /// clamped to the new item count. Returns the resulting index.
    pub fn follow_anchor<F>(&mut self, new_item_count: usize, index_of_key: F) -> usize
    where
        F: Fn(&ItemKey) -> Option<usize>,
    {
        let anchored = self.anchor_key.as_ref().and_then(|key| index_of_key(key));
        match anchored {
            Some(new_index) => self.index = new_index,
            None => {
                self.index = self.index.min(new_item_count.saturating_sub(1));
            }
        }
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults_to_origin() {
        let store = ScrollStateStore::new();
        assert_eq!(store.load(&"missing".into()), ScrollStateRecord::default());
    }

    #[test]
    fn test_clones_share_records() {
        let store = ScrollStateStore::new();
        let other = store.clone();
        let id = CollectionId::explicit("gallery1");
        store.save(&id, 4, 12);
        assert_eq!(other.load(&id), ScrollStateRecord::new(4, 12));
        assert_eq!(other.evict(&id), Some(ScrollStateRecord::new(4, 12)));
        assert!(!store.contains(&id));
    }

    #[test]
    fn test_snapshot_round_trips_through_restore() {
        let store = ScrollStateStore::new();
        store.save(&"a".into(), 1, 2);
        store.save(&"b".into(), 3, 4);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["a", "b"]);

        let restored = ScrollStateStore::new();
        restored.restore(snapshot);
        assert_eq!(restored.load(&"b".into()), ScrollStateRecord::new(3, 4));
    }

    #[test]
    fn test_anchor_follows_moved_item() {
        let mut position = ScrollPosition::new(2, 5);
        position.anchor_key = Some(ItemKey::from("c"));
        let keys = ["x", "a", "b", "c"];
        let index = position.follow_anchor(keys.len(), |key| {
            keys.iter().position(|k| *k == key.as_str())
        });
        assert_eq!(index, 3);
        assert_eq!(position.offset, 5);
    }

    #[test]
    fn test_missing_anchor_clamps() {
        let mut position = ScrollPosition::new(7, 0);
        position.anchor_key = Some(ItemKey::from("gone"));
        assert_eq!(position.follow_anchor(3, |_| None), 2);
        assert_eq!(position.follow_anchor(0, |_| None), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_round_trip() {
        let store = ScrollStateStore::new();
        store.save(&"gallery1".into(), 4, 12);
        let json = store.to_json().unwrap();
        assert_eq!(json, r#"{"gallery1":{"index":4,"offset":12}}"#);
        let restored = ScrollStateStore::from_json(&json).unwrap();
        assert_eq!(restored.load(&"gallery1".into()), ScrollStateRecord::new(4, 12));
    }
}
