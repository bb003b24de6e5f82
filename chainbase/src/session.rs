use crate::error::SnapshotError;
use std::io::{Read, Write};
use std::ops::{Deref, DerefMut};

/// Undo bookkeeping shared by a single index and by a whole database.
pub trait Undoable {
    fn revision(&self) -> i64;

    /// Open a new undo state and return its revision.
    fn push_undo_state(&mut self) -> i64;

    /// Revert everything recorded in the top undo state and drop it.
    fn undo(&mut self);

    /// Merge the top undo state into the one below it.
    fn squash(&mut self);

    /// Forget every undo state with a revision `<= revision`.
    fn commit(&mut self, revision: i64);

    fn undo_all(&mut self);

    /// # Panics
    ///
    /// if an undo state is still open.
    fn set_revision(&mut self, revision: i64);

    fn undo_stack_size(&self) -> usize;

    /// Open an undo session, reverted when the returned guard is dropped
    /// unless it is pushed or squashed first. A disabled session records
    /// nothing and does nothing on drop.
    fn start_undo_session(&mut self, enabled: bool) -> Session<'_, Self>
    where
        Self: Sized,
    {
        let revision = if enabled { self.push_undo_state() } else { -1 };
        Session {
            db: self,
            apply: revision != -1,
            revision,
        }
    }
}

/// Type erased view of an [`Index`](crate::Index).
pub trait AbstractIndex: Undoable {
    fn type_name(&self) -> &'static str;

    fn size(&self) -> usize;

    fn save_section(&self, writer: &mut dyn Write) -> Result<(), SnapshotError>;

    /// Reconcile the content with a saved section: records are updated in
    /// place, created when missing and removed when absent from the
    /// section. Changes are undo tracked like any other.
    fn load_section(&mut self, reader: &mut dyn Read) -> Result<(), SnapshotError>;
}

/// A database made of several indices moving in lock step.
pub trait IndexSet {
    fn indices(&self) -> Vec<&dyn AbstractIndex>;

    fn indices_mut(&mut self) -> Vec<&mut dyn AbstractIndex>;
}

/// Undo operations fanned out over every index of an [`IndexSet`].
///
/// Implementors of [`IndexSet`] forward their [`Undoable`] implementation
/// here so that all indices share the same revision.
pub mod coordinated {
    use super::IndexSet;

    pub fn revision<D: IndexSet + ?Sized>(db: &D) -> i64 {
        db.indices()
            .first()
            .map_or(0, |index| index.revision())
    }

    pub fn push_undo_state<D: IndexSet + ?Sized>(db: &mut D) -> i64 {
        let mut revision = -1;
        for index in db.indices_mut() {
            let index_revision = index.push_undo_state();
            debug_assert!(revision == -1 || revision == index_revision);
            revision = index_revision;
        }
        revision
    }

    pub fn undo<D: IndexSet + ?Sized>(db: &mut D) {
        for index in db.indices_mut() {
            index.undo();
        }
    }

    pub fn squash<D: IndexSet + ?Sized>(db: &mut D) {
        for index in db.indices_mut() {
            index.squash();
        }
    }

    pub fn commit<D: IndexSet + ?Sized>(db: &mut D, revision: i64) {
        for index in db.indices_mut() {
            index.commit(revision);
        }
        tracing::trace!(revision, "undo history committed");
    }

    pub fn undo_all<D: IndexSet + ?Sized>(db: &mut D) {
        for index in db.indices_mut() {
            index.undo_all();
        }
    }

    pub fn set_revision<D: IndexSet + ?Sized>(db: &mut D, revision: i64) {
        for index in db.indices_mut() {
            index.set_revision(revision);
        }
    }

    pub fn undo_stack_size<D: IndexSet + ?Sized>(db: &D) -> usize {
        db.indices()
            .iter()
            .map(|index| index.undo_stack_size())
            .max()
            .unwrap_or(0)
    }
}

/// Guard over an open undo session.
///
/// Work continues through the guard (it dereferences to the database).
/// Nested sessions are opened from the guard itself, which makes the LIFO
/// discipline a borrow-checker rule.
#[must_use = "dropping the session reverts it"]
pub struct Session<'a, D: Undoable> {
    db: &'a mut D,
    apply: bool,
    revision: i64,
}

impl<'a, D: Undoable> Session<'a, D> {
    pub fn revision(&self) -> i64 {
        self.revision
    }

    /// Keep the changes as a distinct undo state.
    pub fn push(mut self) {
        self.apply = false;
    }

    /// Keep the changes by merging them into the enclosing undo state.
    pub fn squash(mut self) {
        if self.apply {
            self.db.squash();
        }
        self.apply = false;
    }

    pub fn undo(mut self) {
        if self.apply {
            self.db.undo();
        }
        self.apply = false;
    }
}

impl<'a, D: Undoable> Deref for Session<'a, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.db
    }
}

impl<'a, D: Undoable> DerefMut for Session<'a, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.db
    }
}

impl<'a, D: Undoable> Drop for Session<'a, D> {
    fn drop(&mut self) {
        if self.apply {
            self.db.undo();
        }
    }
}
