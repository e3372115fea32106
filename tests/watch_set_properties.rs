// tests/watch_set_properties.rs

mod common;
use crate::common::builders::ModuleGraphBuilder;

use std::collections::HashSet;

use proptest::prelude::*;
use rerun::resolve::ModuleResolver;
use rerun::watch::build_watch_set;

fn name(i: usize) -> String {
    format!("acme/m{i}")
}

// Arbitrary import graphs, cycles and self-imports included. Module 0 is
// the executable entry point; some indices past the end are dangling
// imports that fail to resolve.
fn graph_strategy(max_modules: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_modules).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(0..n + 2, 0..5), n)
    })
}

proptest! {
    #[test]
    fn construction_terminates_and_resolves_each_path_at_most_once(
        graph in graph_strategy(12)
    ) {
        let n = graph.len();
        let mut builder = ModuleGraphBuilder::new();
        for (i, imports) in graph.iter().enumerate() {
            let imports: Vec<String> = imports.iter().map(|j| name(*j)).collect();
            let imports: Vec<&str> = imports.iter().map(String::as_str).collect();
            builder = if i == 0 {
                builder.executable(&name(i), &imports)
            } else {
                builder.library(&name(i), &imports)
            };
        }
        let resolver = builder.build();
        let entry = resolver.resolve(&name(0)).unwrap();
        resolver.reset_calls();

        let set = build_watch_set(&resolver, &entry);

        for i in 0..n + 2 {
            prop_assert!(resolver.calls(&name(i)) <= 1);
        }

        // Exactly the modules reachable from the entry are watched.
        let mut reachable = HashSet::new();
        let mut stack = vec![0usize];
        while let Some(i) = stack.pop() {
            if i >= n || !reachable.insert(i) {
                continue;
            }
            stack.extend(graph[i].iter().copied());
        }
        prop_assert_eq!(set.dirs().len(), reachable.len());

        let roots = set.roots();
        let unique: HashSet<_> = roots.iter().collect();
        prop_assert_eq!(unique.len(), roots.len());
    }
}
