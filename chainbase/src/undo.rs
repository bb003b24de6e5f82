use std::collections::{BTreeMap, BTreeSet};

/// What an undo session recorded for one index.
///
/// * `old_values`: pre-image of every record modified for the first time
/// * `removed_values`: pre-image of every pre-existing record removed
/// * `new_ids`: every record created (and still alive) in the session
#[derive(Debug, Clone, PartialEq)]
pub struct UndoState<T> {
    pub(crate) old_values: BTreeMap<u64, T>,
    pub(crate) removed_values: BTreeMap<u64, T>,
    pub(crate) new_ids: BTreeSet<u64>,
    pub(crate) old_next_id: u64,
    pub(crate) revision: i64,
}

impl<T> UndoState<T> {
    pub(crate) fn new(old_next_id: u64, revision: i64) -> Self {
        UndoState {
            old_values: BTreeMap::new(),
            removed_values: BTreeMap::new(),
            new_ids: BTreeSet::new(),
            old_next_id,
            revision,
        }
    }

    pub fn old_values(&self) -> &BTreeMap<u64, T> {
        &self.old_values
    }

    pub fn removed_values(&self) -> &BTreeMap<u64, T> {
        &self.removed_values
    }

    pub fn new_ids(&self) -> &BTreeSet<u64> {
        &self.new_ids
    }

    pub fn old_next_id(&self) -> u64 {
        self.old_next_id
    }

    pub fn revision(&self) -> i64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.old_values.is_empty() && self.removed_values.is_empty() && self.new_ids.is_empty()
    }

    /// Merge `self`, the more recent state, into `prev`.
    ///
    /// Per record, with `prev` on the left and `self` on the right:
    ///
    /// | prev \ self | upd      | new | del      |
    /// |-------------|----------|-----|----------|
    /// | new         | new      | new | nop      |
    /// | upd(X)      | upd(X)   | new | del(X)   |
    /// | del         | illegal  | new | illegal  |
    /// | nop         | upd      | new | del      |
    ///
    /// `prev` keeps its `old_next_id` and `revision`.
    pub fn squash_into(self, prev: &mut UndoState<T>) {
        let UndoState {
            old_values,
            removed_values,
            new_ids,
            ..
        } = self;

        for (id, value) in old_values {
            if prev.new_ids.contains(&id) || prev.old_values.contains_key(&id) {
                continue;
            }
            assert!(
                !prev.removed_values.contains_key(&id),
                "object {} updated after being removed in an earlier session",
                id
            );
            prev.old_values.insert(id, value);
        }

        prev.new_ids.extend(new_ids);

        for (id, value) in removed_values {
            if prev.new_ids.remove(&id) {
                continue;
            }
            if let Some(original) = prev.old_values.remove(&id) {
                prev.removed_values.insert(id, original);
                continue;
            }
            assert!(
                !prev.removed_values.contains_key(&id),
                "object {} removed twice",
                id
            );
            prev.removed_values.insert(id, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(rev: i64) -> UndoState<&'static str> {
        UndoState::new(10, rev)
    }

    #[test]
    fn new_then_update_stays_new() {
        let mut prev = state(1);
        prev.new_ids.insert(3);
        let mut next = state(2);
        next.old_values.insert(3, "created");
        next.squash_into(&mut prev);
        assert!(prev.new_ids.contains(&3));
        assert!(prev.old_values.is_empty());
    }

    #[test]
    fn update_then_update_keeps_first_image() {
        let mut prev = state(1);
        prev.old_values.insert(1, "original");
        let mut next = state(2);
        next.old_values.insert(1, "intermediate");
        next.squash_into(&mut prev);
        assert_eq!(prev.old_values.get(&1), Some(&"original"));
    }

    #[test]
    fn nop_then_update_takes_image() {
        let mut prev = state(1);
        let mut next = state(2);
        next.old_values.insert(1, "original");
        next.squash_into(&mut prev);
        assert_eq!(prev.old_values.get(&1), Some(&"original"));
    }

    #[test]
    fn new_then_remove_is_nop() {
        let mut prev = state(1);
        prev.new_ids.insert(4);
        let mut next = state(2);
        next.removed_values.insert(4, "created");
        next.squash_into(&mut prev);
        assert!(prev.is_empty());
    }

    #[test]
    fn update_then_remove_removes_original() {
        let mut prev = state(1);
        prev.old_values.insert(1, "original");
        let mut next = state(2);
        next.removed_values.insert(1, "intermediate");
        next.squash_into(&mut prev);
        assert!(prev.old_values.is_empty());
        assert_eq!(prev.removed_values.get(&1), Some(&"original"));
    }

    #[test]
    fn nop_then_remove_takes_image() {
        let mut prev = state(1);
        let mut next = state(2);
        next.removed_values.insert(1, "original");
        next.new_ids.insert(11);
        next.squash_into(&mut prev);
        assert_eq!(prev.removed_values.get(&1), Some(&"original"));
        assert!(prev.new_ids.contains(&11));
        assert_eq!(prev.revision, 1);
        assert_eq!(prev.old_next_id, 10);
    }

    #[test]
    #[should_panic]
    fn remove_then_update_is_illegal() {
        let mut prev = state(1);
        prev.removed_values.insert(1, "original");
        let mut next = state(2);
        next.old_values.insert(1, "original");
        next.squash_into(&mut prev);
    }

    #[test]
    #[should_panic]
    fn remove_then_remove_is_illegal() {
        let mut prev = state(1);
        prev.removed_values.insert(1, "original");
        let mut next = state(2);
        next.removed_values.insert(1, "original");
        next.squash_into(&mut prev);
    }
}
