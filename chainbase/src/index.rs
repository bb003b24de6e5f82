use crate::error::{Error, SnapshotError};
use crate::object::{Key, KeyId, Object, ObjectId, SecondaryKey};
use crate::session::{AbstractIndex, Undoable};
use crate::undo::UndoState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io::{Read, Write};
use std::ops::Bound;

struct KeySet<T> {
    def: SecondaryKey<T>,
    entries: BTreeSet<(Key, u64)>,
}

impl<T> KeySet<T> {
    fn taken_by_other(&self, key: &Key, id: u64) -> bool {
        self.def.is_unique()
            && self
                .entries
                .range((key.clone(), 0)..=(key.clone(), u64::MAX))
                .any(|(_, other)| *other != id)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SectionHeader {
    type_name: String,
    size: u64,
    /// Id counter of the saved index, ids of removed records are not
    /// handed out again after a load.
    next_id: u64,
}

/// Ordered container of one record type, with undo tracking.
///
/// Records are ordered by id; every key declared by
/// [`Object::secondary_keys`] gets its own ordering. Every mutation made
/// while an undo state is open is recorded in the top state so that
/// [`undo`](Undoable::undo) restores the exact previous content,
/// including the id counter.
pub struct Index<T: Object> {
    objects: BTreeMap<u64, T>,
    keys: Vec<KeySet<T>>,
    stack: VecDeque<UndoState<T>>,
    revision: i64,
    next_id: u64,
}

impl<T: Object> Default for Index<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Object> Index<T> {
    pub fn new() -> Self {
        let keys = T::secondary_keys()
            .into_iter()
            .map(|def| KeySet {
                def,
                entries: BTreeSet::new(),
            })
            .collect();
        Index {
            objects: BTreeMap::new(),
            keys,
            stack: VecDeque::new(),
            revision: 0,
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn find(&self, id: ObjectId<T>) -> Option<&T> {
        self.objects.get(&id.value())
    }

    pub fn get(&self, id: ObjectId<T>) -> Result<&T, Error> {
        self.find(id).ok_or(Error::ObjectNotFound {
            type_name: T::TYPE_NAME,
            id: id.value(),
        })
    }

    /// Iterate in id order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.objects.values()
    }

    /// First record whose `key_id` key equals `key`.
    pub fn find_by(&self, key_id: KeyId, key: &Key) -> Option<&T> {
        self.range_by(key_id, key)
            .next()
            .filter(|(found, _)| *found == key)
            .map(|(_, object)| object)
    }

    /// Iterate in `key_id` order.
    pub fn iter_by(&self, key_id: KeyId) -> impl Iterator<Item = &T> + '_ {
        let objects = &self.objects;
        self.keys[key_id.0]
            .entries
            .iter()
            .filter_map(move |(_, id)| objects.get(id))
    }

    /// Iterate in `key_id` order starting at the first key `>= from`,
    /// yielding each record with its key.
    pub fn range_by<'a>(
        &'a self,
        key_id: KeyId,
        from: &Key,
    ) -> impl Iterator<Item = (&'a Key, &'a T)> + 'a {
        let objects = &self.objects;
        self.keys[key_id.0]
            .entries
            .range((Bound::Included((from.clone(), 0)), Bound::Unbounded))
            .filter_map(move |(key, id)| objects.get(id).map(|o| (key, o)))
    }

    /// Records whose `key_id` key starts with `prefix`, in key order.
    pub fn prefix_by<'a>(&'a self, key_id: KeyId, prefix: &Key) -> impl Iterator<Item = &'a T> + 'a {
        let prefix = prefix.clone();
        self.range_by(key_id, &prefix)
            .take_while(move |(key, _)| key.starts_with(&prefix))
            .map(|(_, object)| object)
    }

    pub fn undo_states(&self) -> impl Iterator<Item = &UndoState<T>> + '_ {
        self.stack.iter()
    }

    /// Insert a new record built by `constructor` from the next free id.
    pub fn create<F>(&mut self, constructor: F) -> Result<&T, Error>
    where
        F: FnOnce(ObjectId<T>) -> T,
    {
        let id = ObjectId::new(self.next_id);
        let object = constructor(id);
        if object.id() != id {
            return Err(Error::IdentityChanged {
                type_name: T::TYPE_NAME,
                id: id.value(),
            });
        }
        self.insert_checked(object)?;
        self.next_id += 1;
        self.on_create(id.value());
        self.get(id)
    }

    /// Apply `mutator` to the record `id`.
    ///
    /// The mutation is applied to a copy first: on error the stored record
    /// and every ordering are left untouched.
    pub fn modify<F>(&mut self, id: ObjectId<T>, mutator: F) -> Result<&T, Error>
    where
        F: FnOnce(&mut T),
    {
        let raw = id.value();
        let mut updated = self.get(id)?.clone();
        mutator(&mut updated);
        if updated.id() != id {
            return Err(Error::IdentityChanged {
                type_name: T::TYPE_NAME,
                id: raw,
            });
        }

        let new_keys = self.key_values(&updated);
        self.check_unique(&new_keys, raw)?;
        let old_keys = self.key_values(self.get(id)?);

        if let Some(previous) = self.objects.insert(raw, updated) {
            self.on_modify(raw, previous);
        }
        for (set, (old, new)) in self.keys.iter_mut().zip(old_keys.into_iter().zip(new_keys)) {
            if old != new {
                set.entries.remove(&(old, raw));
                set.entries.insert((new, raw));
            }
        }
        self.get(id)
    }

    pub fn remove(&mut self, id: ObjectId<T>) -> Result<T, Error> {
        let raw = id.value();
        let object = self.erase(raw).ok_or(Error::ObjectNotFound {
            type_name: T::TYPE_NAME,
            id: raw,
        })?;
        self.on_remove(raw, &object);
        Ok(object)
    }

    fn key_values(&self, object: &T) -> Vec<Key> {
        self.keys.iter().map(|set| set.def.extract(object)).collect()
    }

    fn check_unique(&self, keys: &[Key], id: u64) -> Result<(), Error> {
        for (set, key) in self.keys.iter().zip(keys) {
            if set.taken_by_other(key, id) {
                return Err(Error::ConstraintViolation {
                    type_name: T::TYPE_NAME,
                    key_name: set.def.name(),
                    key: key.to_string(),
                    id,
                });
            }
        }
        Ok(())
    }

    fn insert_checked(&mut self, object: T) -> Result<(), Error> {
        let raw = object.id().value();
        let keys = self.key_values(&object);
        self.check_unique(&keys, raw)?;
        self.insert_raw(raw, keys, object);
        Ok(())
    }

    fn insert_raw(&mut self, raw: u64, keys: Vec<Key>, object: T) {
        for (set, key) in self.keys.iter_mut().zip(keys) {
            set.entries.insert((key, raw));
        }
        self.objects.insert(raw, object);
    }

    fn erase(&mut self, raw: u64) -> Option<T> {
        let object = self.objects.remove(&raw)?;
        for set in self.keys.iter_mut() {
            let key = set.def.extract(&object);
            set.entries.remove(&(key, raw));
        }
        Some(object)
    }

    fn restore(&mut self, raw: u64, original: T) {
        self.erase(raw);
        let keys = self.key_values(&original);
        self.insert_raw(raw, keys, original);
    }

    fn on_create(&mut self, raw: u64) {
        if let Some(state) = self.stack.back_mut() {
            state.new_ids.insert(raw);
        }
    }

    fn on_modify(&mut self, raw: u64, previous: T) {
        if let Some(state) = self.stack.back_mut() {
            if state.new_ids.contains(&raw) || state.old_values.contains_key(&raw) {
                return;
            }
            state.old_values.insert(raw, previous);
        }
    }

    fn on_remove(&mut self, raw: u64, object: &T) {
        if let Some(state) = self.stack.back_mut() {
            if state.new_ids.remove(&raw) {
                return;
            }
            if let Some(original) = state.old_values.remove(&raw) {
                state.removed_values.insert(raw, original);
                return;
            }
            if state.removed_values.contains_key(&raw) {
                return;
            }
            state.removed_values.insert(raw, object.clone());
        }
    }

    fn verify_unique(&self) -> Result<(), Error> {
        for set in self.keys.iter().filter(|set| set.def.is_unique()) {
            let mut previous: Option<&Key> = None;
            for (key, id) in set.entries.iter() {
                if previous == Some(key) {
                    return Err(Error::ConstraintViolation {
                        type_name: T::TYPE_NAME,
                        key_name: set.def.name(),
                        key: key.to_string(),
                        id: *id,
                    });
                }
                previous = Some(key);
            }
        }
        Ok(())
    }
}

impl<T: Object> Undoable for Index<T> {
    fn revision(&self) -> i64 {
        self.revision
    }

    fn push_undo_state(&mut self) -> i64 {
        self.revision += 1;
        self.stack
            .push_back(UndoState::new(self.next_id, self.revision));
        self.revision
    }

    fn undo(&mut self) {
        let state = match self.stack.pop_back() {
            Some(state) => state,
            None => return,
        };

        for (raw, original) in state.old_values {
            self.restore(raw, original);
        }
        for raw in state.new_ids {
            self.erase(raw);
        }
        self.next_id = state.old_next_id;
        for (raw, original) in state.removed_values {
            let keys = self.key_values(&original);
            self.insert_raw(raw, keys, original);
        }

        self.revision -= 1;
    }

    fn squash(&mut self) {
        match self.stack.len() {
            0 => return,
            1 => {
                self.stack.pop_front();
            }
            _ => {
                if let Some(top) = self.stack.pop_back() {
                    if let Some(prev) = self.stack.back_mut() {
                        top.squash_into(prev);
                    }
                }
            }
        }
        self.revision -= 1;
    }

    fn commit(&mut self, revision: i64) {
        while self
            .stack
            .front()
            .map_or(false, |state| state.revision <= revision)
        {
            self.stack.pop_front();
        }
    }

    fn undo_all(&mut self) {
        while !self.stack.is_empty() {
            self.undo();
        }
    }

    fn set_revision(&mut self, revision: i64) {
        assert!(
            self.stack.is_empty(),
            "cannot set revision of {} while there is an existing undo stack",
            T::TYPE_NAME
        );
        self.revision = revision;
    }

    fn undo_stack_size(&self) -> usize {
        self.stack.len()
    }
}

impl<T: Object> AbstractIndex for Index<T> {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn save_section(&self, writer: &mut dyn Write) -> Result<(), SnapshotError> {
        let header = SectionHeader {
            type_name: T::TYPE_NAME.to_owned(),
            size: self.objects.len() as u64,
            next_id: self.next_id,
        };
        bincode::serialize_into(&mut *writer, &header)?;
        for object in self.objects.values() {
            bincode::serialize_into(&mut *writer, object)?;
        }
        Ok(())
    }

    fn load_section(&mut self, reader: &mut dyn Read) -> Result<(), SnapshotError> {
        let header: SectionHeader = bincode::deserialize_from(&mut *reader)?;
        if header.type_name != T::TYPE_NAME {
            return Err(SnapshotError::SectionMismatch {
                expected: T::TYPE_NAME,
                found: header.type_name,
            });
        }

        let mut loaded = BTreeMap::new();
        for _ in 0..header.size {
            let object: T = bincode::deserialize_from(&mut *reader)?;
            loaded.insert(object.id().value(), object);
        }

        let stale: Vec<u64> = self
            .objects
            .keys()
            .filter(|id| !loaded.contains_key(id))
            .copied()
            .collect();
        for raw in stale {
            self.remove(ObjectId::new(raw))?;
        }

        // records are swapped in all at once, a saved state may only be
        // reachable through transient key collisions
        let changed: Vec<(u64, T)> = loaded
            .into_iter()
            .filter(|(raw, object)| self.objects.get(raw) != Some(object))
            .collect();
        for (raw, _) in changed.iter() {
            match self.erase(*raw) {
                Some(previous) => self.on_modify(*raw, previous),
                None => self.on_create(*raw),
            }
        }
        for (raw, object) in changed {
            let keys = self.key_values(&object);
            self.insert_raw(raw, keys, object);
        }
        let past_last = self.objects.keys().next_back().map_or(0, |raw| raw + 1);
        self.next_id = header.next_id.max(past_last);
        self.verify_unique()?;

        tracing::debug!(
            type_name = T::TYPE_NAME,
            size = self.objects.len(),
            "snapshot section loaded"
        );
        Ok(())
    }
}
