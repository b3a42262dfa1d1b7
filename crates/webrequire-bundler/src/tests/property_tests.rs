//! Property-based checks of the packer using proptest.
//!
//! Graphs are generated as `n` files where file `i` requires an arbitrary
//! subset of the others, cycles included.

use std::sync::Arc;

use proptest::prelude::*;
use rustc_hash::FxHashMap;

use crate::packer::plan;
use crate::{DependencyGraph, FileId, GraphOptions, GraphSnapshot, SourceFile};
use webrequire_graph::test_utils::TestRuntime;

fn graph_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..9).prop_flat_map(|n| prop::collection::vec(prop::collection::vec(0..n, 0..4), n))
}

fn snapshot_of(requirements: &[Vec<usize>]) -> GraphSnapshot {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    runtime.block_on(async {
        let graph = DependencyGraph::new(
            GraphOptions::new("/app"),
            Arc::new(TestRuntime::new("/app")),
        )
        .unwrap();

        for (index, targets) in requirements.iter().enumerate() {
            let source: String = targets
                .iter()
                .filter(|target| **target != index)
                .map(|target| format!("require('./f{target}');\n"))
                .collect();
            graph
                .update(SourceFile::new(format!("/app/f{index}.js"), source))
                .await
                .unwrap();
        }

        graph.link().unwrap();
        graph.snapshot()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: every file lands in exactly one pack.
    #[test]
    fn prop_no_file_is_packed_twice(requirements in graph_strategy(), smart in any::<bool>()) {
        let snapshot = snapshot_of(&requirements);
        let plan = plan(&snapshot, &[], smart).unwrap();

        let mut seen: FxHashMap<&FileId, usize> = FxHashMap::default();
        for pack in &plan.packs {
            for file in &pack.files {
                *seen.entry(file).or_default() += 1;
            }
        }

        prop_assert_eq!(seen.len(), snapshot.len());
        prop_assert!(seen.values().all(|count| *count == 1));
    }

    /// Property: a file's mapping starts with its own pack and covers the
    /// packs of everything it requires.
    #[test]
    fn prop_mapping_covers_requirements(requirements in graph_strategy()) {
        let snapshot = snapshot_of(&requirements);
        let plan = plan(&snapshot, &[], true).unwrap();

        for id in snapshot.ids() {
            let packs = &plan.mapping[id];
            prop_assert_eq!(packs[0], plan.locations[id]);

            let node = snapshot.node(id).unwrap();
            for requirement in node.requirements.iter() {
                prop_assert!(packs.contains(&plan.locations[requirement]));
            }
        }
    }

    /// Property: packing settles within the round ceiling.
    #[test]
    fn prop_rounds_are_bounded(requirements in graph_strategy()) {
        let snapshot = snapshot_of(&requirements);
        let plan = plan(&snapshot, &[], true).unwrap();
        prop_assert!(plan.rounds <= snapshot.len() + 1);
    }
}
