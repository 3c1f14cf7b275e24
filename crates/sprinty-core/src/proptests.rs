//! Property-based tests for spec §8 invariants 1–3, grounded in the
//! workspace's `proptest` dev-dependency (carried from the teacher's own
//! `[workspace.dev-dependencies]` table, unused there but declared for
//! exactly this purpose).

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use sprinty_data::{store, Backlog, ItemStatus, ItemType};

    use crate::backlog::BacklogEngine;

    fn engine() -> (tempfile::TempDir, BacklogEngine) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backlog.json");
        let engine = BacklogEngine::new(path);
        engine.init("demo").unwrap();
        (dir, engine)
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(i32),
        RemoveOldest,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1..30i32).prop_map(Op::Add),
            Just(Op::RemoveOldest),
        ]
    }

    proptest! {
        /// Invariant 1: `metadata.total_items == len(items)` and
        /// `metadata.total_points == sum(items[].story_points)` after every
        /// write, for any interleaving of adds and removes.
        #[test]
        fn invariant_1_metadata_always_matches_items(ops in prop::collection::vec(op_strategy(), 0..20)) {
            let (dir, eng) = engine();
            let mut live: Vec<String> = Vec::new();

            for op in ops {
                match op {
                    Op::Add(points) => {
                        let item = eng.add("item", ItemType::Feature, 1, points, vec![]).unwrap();
                        live.push(item.id);
                    }
                    Op::RemoveOldest => {
                        if !live.is_empty() {
                            let id = live.remove(0);
                            eng.remove(&id).unwrap();
                        }
                    }
                }

                let backlog: Backlog = store::read_json(&dir.path().join("backlog.json")).unwrap();
                prop_assert_eq!(backlog.metadata.total_items, backlog.items.len());
                let expected_points: i64 = backlog.items.iter().map(|i| i.story_points as i64).sum();
                prop_assert_eq!(backlog.metadata.total_points, expected_points);
            }
        }

        /// Invariants 2 & 3: every subtask's `parent_id` resolves back to a
        /// parent that lists it in `subtasks` (and vice versa), and the
        /// suffix letters assigned to one parent's children form a dense
        /// `a, b, c, …` prefix in creation order.
        #[test]
        fn invariants_2_and_3_subtask_consistency_and_dense_suffixes(child_count in 1usize..8) {
            let (_dir, eng) = engine();
            let parent = eng.add("Big Feature", ItemType::Feature, 1, 20, vec![]).unwrap();

            let mut expected_suffixes = Vec::new();
            for i in 0..child_count {
                let child = eng.break_down(&parent.id, &format!("child-{i}"), 1, None).unwrap();
                let suffix = child.id.chars().last().unwrap();
                expected_suffixes.push(suffix);

                let parent_now = eng.get(&parent.id).unwrap();
                prop_assert!(parent_now.subtasks.contains(&child.id));
                prop_assert_eq!(child.parent_id.as_deref(), Some(parent.id.as_str()));

                for subtask_id in &parent_now.subtasks {
                    let subtask = eng.get(subtask_id).unwrap();
                    prop_assert_eq!(subtask.parent_id.as_deref(), Some(parent.id.as_str()));
                }
            }

            let dense: Vec<char> = (0..expected_suffixes.len() as u8).map(|n| (b'a' + n) as char).collect();
            prop_assert_eq!(expected_suffixes, dense);
        }
    }

    #[test]
    fn roundtrip_add_remove_restores_initial_metadata() {
        let (dir, eng) = engine();
        let before: Backlog = store::read_json(&dir.path().join("backlog.json")).unwrap();

        let item = eng.add("Temp", ItemType::Chore, 1, 4, vec![]).unwrap();
        eng.remove(&item.id).unwrap();

        let after: Backlog = store::read_json(&dir.path().join("backlog.json")).unwrap();
        assert_eq!(before.metadata, after.metadata);
    }

    #[test]
    fn breakdown_then_complete_all_then_rollup_marks_parent_done() {
        let (_dir, eng) = engine();
        let parent = eng.add("Big Feature", ItemType::Feature, 1, 20, vec![]).unwrap();
        let a = eng.break_down(&parent.id, "A", 5, None).unwrap();
        let b = eng.break_down(&parent.id, "B", 5, None).unwrap();

        eng.set_status(&a.id, ItemStatus::Done).unwrap();
        eng.set_status(&b.id, ItemStatus::Done).unwrap();

        assert_eq!(eng.roll_up(&parent.id).unwrap(), ItemStatus::Done);
    }
}
