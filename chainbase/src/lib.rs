//! Versioned object store.
//!
//! An [`Index`] keeps the records of one type ordered by id and by any
//! number of secondary keys. Mutations go through `create`, `modify` and
//! `remove` and are recorded in a stack of [`UndoState`]s so that any
//! open session can be reverted exactly, squashed into its parent or
//! committed once it is beyond any possible rollback.
//!
//! A database holding several indices implements [`IndexSet`] and forwards
//! its [`Undoable`] implementation to [`coordinated`], so that every index
//! moves through the same revisions.
#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

mod error;
mod index;
mod object;
mod session;
mod undo;

pub use error::{Error, SnapshotError};
pub use index::Index;
pub use object::{Key, KeyId, KeyPart, Object, ObjectId, SecondaryKey};
pub use session::{coordinated, AbstractIndex, IndexSet, Session, Undoable};
pub use undo::UndoState;

#[cfg(test)]
mod tests {
    use super::*;

    use quickcheck::{Arbitrary, Gen};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: ObjectId<Item>,
        name: String,
        value: u32,
    }

    const BY_NAME: KeyId = KeyId(0);
    const BY_VALUE: KeyId = KeyId(1);

    impl Object for Item {
        const TYPE_NAME: &'static str = "item";

        fn id(&self) -> ObjectId<Self> {
            self.id
        }

        fn secondary_keys() -> Vec<SecondaryKey<Self>> {
            vec![
                SecondaryKey::unique("by_name", |item| key![item.name.as_str()]),
                SecondaryKey::non_unique("by_value", |item| key![item.value]),
            ]
        }
    }

    #[derive(Debug, Clone)]
    enum PlanOperation {
        Create(u8, u32),
        Modify(usize, u32),
        Rename(usize, u8),
        Remove(usize),
    }

    #[derive(Debug, Clone)]
    struct Plan(Vec<PlanOperation>);

    const NAMES: u8 = 24;

    impl Arbitrary for Plan {
        fn arbitrary<G: Gen>(g: &mut G) -> Plan {
            let nb_ops = usize::arbitrary(g) % 40;
            let mut v = Vec::with_capacity(nb_ops);
            for _ in 0..nb_ops {
                let op_nb: u32 = Arbitrary::arbitrary(g);
                let op = match op_nb % 4 {
                    0 => PlanOperation::Create(u8::arbitrary(g) % NAMES, u32::arbitrary(g) % 8),
                    1 => PlanOperation::Modify(Arbitrary::arbitrary(g), u32::arbitrary(g) % 8),
                    2 => PlanOperation::Rename(Arbitrary::arbitrary(g), u8::arbitrary(g) % NAMES),
                    _ => PlanOperation::Remove(Arbitrary::arbitrary(g)),
                };
                v.push(op)
            }
            Plan(v)
        }
    }

    fn nth_id(index: &Index<Item>, n: usize) -> Option<ObjectId<Item>> {
        let len = index.len();
        if len == 0 {
            return None;
        }
        index.iter().nth(n % len).map(|item| item.id)
    }

    // errors (duplicate names) are part of the plan: they must leave the
    // index untouched, which the content comparisons below also check
    fn run(index: &mut Index<Item>, plan: &Plan) {
        for op in plan.0.iter() {
            match op {
                PlanOperation::Create(name, value) => {
                    let _ = index.create(|id| Item {
                        id,
                        name: format!("item-{}", name),
                        value: *value,
                    });
                }
                PlanOperation::Modify(n, value) => {
                    if let Some(id) = nth_id(index, *n) {
                        index.modify(id, |item| item.value = *value).unwrap();
                    }
                }
                PlanOperation::Rename(n, name) => {
                    if let Some(id) = nth_id(index, *n) {
                        let _ = index.modify(id, |item| item.name = format!("item-{}", name));
                    }
                }
                PlanOperation::Remove(n) => {
                    if let Some(id) = nth_id(index, *n) {
                        index.remove(id).unwrap();
                    }
                }
            }
        }
    }

    #[derive(Debug, PartialEq)]
    struct Content {
        items: Vec<Item>,
        by_name: Vec<u64>,
        by_value: Vec<u64>,
        next_id: u64,
    }

    fn content(index: &Index<Item>) -> Content {
        Content {
            items: index.iter().cloned().collect(),
            by_name: index.iter_by(BY_NAME).map(|i| i.id.value()).collect(),
            by_value: index.iter_by(BY_VALUE).map(|i| i.id.value()).collect(),
            next_id: index.next_id(),
        }
    }

    #[quickcheck]
    fn undo_restores_content(before: Plan, during: Plan) -> bool {
        let mut index = Index::new();
        run(&mut index, &before);
        let reference = content(&index);
        {
            let mut session = index.start_undo_session(true);
            run(&mut session, &during);
        }
        content(&index) == reference && index.undo_stack_size() == 0
    }

    #[quickcheck]
    fn squashed_sessions_undo_together(before: Plan, first: Plan, second: Plan) -> bool {
        let mut index = Index::new();
        run(&mut index, &before);
        let reference = content(&index);

        let mut outer = index.start_undo_session(true);
        run(&mut outer, &first);
        {
            let mut inner = outer.start_undo_session(true);
            run(&mut inner, &second);
            inner.squash();
        }
        let stacked = outer.undo_stack_size();
        outer.undo();

        stacked == 1 && content(&index) == reference
    }

    #[quickcheck]
    fn squash_is_associative(before: Plan, a: Plan, b: Plan, c: Plan) -> bool {
        let mut index = Index::new();
        run(&mut index, &before);
        for plan in [a, b, c].iter() {
            let mut session = index.start_undo_session(true);
            run(&mut session, plan);
            session.push();
        }
        let states: Vec<UndoState<Item>> = index.undo_states().cloned().collect();
        let (sa, sb, sc) = (states[0].clone(), states[1].clone(), states[2].clone());

        let mut left = sa.clone();
        sb.clone().squash_into(&mut left);
        sc.clone().squash_into(&mut left);

        let mut bc = sb;
        sc.squash_into(&mut bc);
        let mut right = sa;
        bc.squash_into(&mut right);

        left == right
    }

    #[test]
    fn unique_key_is_enforced() {
        let mut index = Index::new();
        let alice = index
            .create(|id| Item {
                id,
                name: "alice".to_owned(),
                value: 1,
            })
            .unwrap()
            .id;
        let bob = index
            .create(|id| Item {
                id,
                name: "bob".to_owned(),
                value: 1,
            })
            .unwrap()
            .id;

        let duplicate = index.create(|id| Item {
            id,
            name: "alice".to_owned(),
            value: 2,
        });
        assert!(matches!(duplicate, Err(Error::ConstraintViolation { .. })));
        assert_eq!(index.next_id(), 2);

        let renamed = index.modify(bob, |item| item.name = "alice".to_owned());
        assert!(matches!(renamed, Err(Error::ConstraintViolation { .. })));
        assert_eq!(index.get(bob).unwrap().name, "bob");
        assert_eq!(index.find_by(BY_NAME, &key!["alice"]).unwrap().id, alice);
        assert_eq!(index.prefix_by(BY_VALUE, &key![1u32]).count(), 2);
    }

    #[test]
    fn identity_cannot_change() {
        let mut index = Index::new();
        let id = index
            .create(|id| Item {
                id,
                name: "alice".to_owned(),
                value: 1,
            })
            .unwrap()
            .id;
        let result = index.modify(id, |item| item.id = ObjectId::new(42));
        assert_eq!(
            result.map(|_| ()),
            Err(Error::IdentityChanged {
                type_name: "item",
                id: 0
            })
        );
    }

    #[test]
    fn removing_a_created_record_leaves_no_trace() {
        let mut index: Index<Item> = Index::new();
        let mut session = index.start_undo_session(true);
        let id = session
            .create(|id| Item {
                id,
                name: "temp".to_owned(),
                value: 0,
            })
            .unwrap()
            .id;
        session.remove(id).unwrap();
        assert!(session.undo_states().all(|state| state.is_empty()));
        session.push();
        assert_eq!(index.undo_stack_size(), 1);
    }

    #[test]
    fn commit_prunes_old_states() {
        let mut index: Index<Item> = Index::new();
        for _ in 0..3 {
            index.start_undo_session(true).push();
        }
        assert_eq!(index.revision(), 3);
        index.commit(2);
        assert_eq!(index.undo_stack_size(), 1);
        assert_eq!(index.undo_states().next().unwrap().revision(), 3);
        index.undo_all();
        assert_eq!(index.undo_stack_size(), 0);
        assert_eq!(index.revision(), 2);
    }

    #[test]
    fn disabled_session_is_inert() {
        let mut index: Index<Item> = Index::new();
        {
            let mut session = index.start_undo_session(false);
            assert_eq!(session.revision(), -1);
            session
                .create(|id| Item {
                    id,
                    name: "kept".to_owned(),
                    value: 0,
                })
                .unwrap();
        }
        assert_eq!(index.len(), 1);
        assert_eq!(index.revision(), 0);
    }

    #[test]
    #[should_panic]
    fn set_revision_with_open_state_panics() {
        let mut index: Index<Item> = Index::new();
        index.start_undo_session(true).push();
        index.set_revision(10);
    }

    #[quickcheck]
    fn snapshot_section_reconciles(saved: Plan, drift: Plan) -> bool {
        let mut source = Index::new();
        run(&mut source, &saved);
        let mut bytes = Vec::new();
        source.save_section(&mut bytes).unwrap();

        let mut target = Index::new();
        run(&mut target, &saved);
        run(&mut target, &drift);
        target.load_section(&mut bytes.as_slice()).unwrap();

        content(&target) == content(&source)
    }

    #[test]
    fn loaded_section_keeps_removed_ids_retired() {
        let mut source = Index::new();
        for name in ["a", "b", "c"].iter() {
            source
                .create(|id| Item {
                    id,
                    name: name.to_string(),
                    value: 0,
                })
                .unwrap();
        }
        source.remove(ObjectId::new(2)).unwrap();
        let mut bytes = Vec::new();
        source.save_section(&mut bytes).unwrap();

        let mut restored: Index<Item> = Index::new();
        {
            let mut session = restored.start_undo_session(true);
            session.load_section(&mut bytes.as_slice()).unwrap();
            assert_eq!(session.next_id(), 3);
        }
        assert_eq!(restored.next_id(), 0);

        restored.load_section(&mut bytes.as_slice()).unwrap();
        let created = restored
            .create(|id| Item {
                id,
                name: "d".to_owned(),
                value: 0,
            })
            .unwrap()
            .id;
        assert_eq!(created.value(), 3);
    }
}
