//! Property-Based Testing for graph synthesis
//!
//! Random acyclic dependency sets (edges only from lower to higher index)
//! are compiled and the structured graph checked against its invariants.

use proptest::prelude::*;

use weft::ast::{ActionType, Config, Step, Workflow};
use weft::dag::{build_input_graph, build_workflow_graph, paired_join_name, Dag, NodeKind, Transitions};

prop_compose! {
    /// (step count, dependency matrix) with edges only i -> j for i < j
    fn arb_dependencies()(n in 1usize..12)(
        n in Just(n),
        bits in prop::collection::vec(prop::bool::weighted(0.3), n * n),
    ) -> (usize, Vec<Vec<usize>>) {
        let deps = (0..n)
            .map(|j| (0..j).filter(|&i| bits[i * n + j]).collect())
            .collect();
        (n, deps)
    }
}

fn workflow(n: usize, deps: &[Vec<usize>]) -> Workflow {
    Workflow {
        name: "prop".into(),
        actions: (0..n)
            .map(|j| Step {
                name: format!("s{j}"),
                action_type: "t".into(),
                dependencies: deps[j].iter().map(|i| format!("s{i}")).collect(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

fn config(with_kill: bool) -> Config {
    Config {
        action_types: vec![ActionType {
            name: "t".into(),
            tag: "t".into(),
            ..Default::default()
        }],
        kill_name: with_kill.then(|| "kill".to_string()),
        kill_message: with_kill.then(|| "failed".to_string()),
        ..Default::default()
    }
}

fn synthesize(wf: &Workflow, config: &Config) -> (Dag, Dag) {
    let input = build_input_graph(wf, None).unwrap();
    let graph = build_workflow_graph(&input, wf, config).unwrap();
    (input, graph)
}

proptest! {
    /// Property: dependency order survives synthesis as reachability
    #[test]
    fn dependencies_are_preserved((n, deps) in arb_dependencies()) {
        let wf = workflow(n, &deps);
        let (input, graph) = synthesize(&wf, &config(false));
        for (from, to) in input.edges() {
            prop_assert!(graph.has_path(from, to), "{from} -> {to} lost");
        }
    }

    /// Property: one start, one end, kill only when configured, all reachable
    #[test]
    fn terminals_and_reachability((n, deps) in arb_dependencies(), with_kill in any::<bool>()) {
        let wf = workflow(n, &deps);
        let (_, graph) = synthesize(&wf, &config(with_kill));

        prop_assert_eq!(graph.nodes_of_kind(NodeKind::Start).count(), 1);
        prop_assert_eq!(graph.nodes_of_kind(NodeKind::End).count(), 1);
        prop_assert_eq!(graph.nodes_of_kind(NodeKind::Kill).count(), usize::from(with_kill));

        let reached = graph.depth_first("start").len();
        prop_assert_eq!(reached, graph.len() - usize::from(with_kill));
    }

    /// Property: every fork has its join, and every branch reaches it
    #[test]
    fn forks_close_at_their_joins((n, deps) in arb_dependencies()) {
        let wf = workflow(n, &deps);
        let (_, graph) = synthesize(&wf, &config(false));

        let forks: Vec<String> = graph
            .nodes_of_kind(NodeKind::Fork)
            .map(|f| f.name().to_string())
            .collect();
        prop_assert_eq!(forks.len(), graph.nodes_of_kind(NodeKind::Join).count());

        for fork in &forks {
            let join = paired_join_name(fork).unwrap();
            prop_assert!(graph.contains(&join));
            prop_assert!(graph.out_degree(fork) >= 2);
            for branch in graph.successors(fork) {
                prop_assert!(graph.has_path(branch, &join), "{branch} escapes {fork}");
            }
        }
    }

    /// Property: enclosing-join lookup is idempotent
    #[test]
    fn enclosing_join_is_idempotent((n, deps) in arb_dependencies()) {
        let wf = workflow(n, &deps);
        let (_, graph) = synthesize(&wf, &config(false));
        let resolver = Transitions::new(&graph, &wf);

        for name in graph.names() {
            let first = resolver.enclosing_join(name);
            prop_assert_eq!(resolver.enclosing_join(name), first.clone());
            if let Some(join) = first {
                prop_assert!(graph.has_path(name, &join));
            }
        }
    }

    /// Property: non-control nodes have exactly one structural successor
    #[test]
    fn steps_have_single_successor((n, deps) in arb_dependencies()) {
        let wf = workflow(n, &deps);
        let (_, graph) = synthesize(&wf, &config(false));
        for node in graph.nodes_of_kind(NodeKind::Step) {
            prop_assert_eq!(graph.out_degree(node.name()), 1);
        }
    }
}
