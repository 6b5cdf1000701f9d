//! Wave construction: a topological sort (Kahn's algorithm) of a `TaskGraph`
//! into waves of mutually-independent nodes, each wave runnable in parallel
//! (spec §4.6 "wave construction").

use std::collections::{HashMap, HashSet, VecDeque};

use super::task_graph::TaskGraph;

pub struct Waves {
    pub waves: Vec<Vec<String>>,
    /// `true` if a cycle was found; the cyclic remainder was collapsed into
    /// one final wave rather than rejecting the whole graph (spec §4.6
    /// "collapsing cycles into one wave with a warning event").
    pub had_cycle: bool,
}

/// Builds execution waves from `graph` via Kahn's algorithm. Node ids that
/// don't correspond to a registered node are ignored as edge endpoints.
pub fn build_waves(graph: &TaskGraph) -> Waves {
    let mut in_degree: HashMap<&str, usize> = graph.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();

    for (from, to) in &graph.edges {
        if !in_degree.contains_key(from.as_str()) || !in_degree.contains_key(to.as_str()) {
            continue;
        }
        *in_degree.get_mut(to.as_str()).unwrap() += 1;
        adjacency.entry(from.as_str()).or_default().push(to.as_str());
    }

    let mut ready: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();
    let mut sorted_ready: Vec<&str> = ready.iter().copied().collect();
    sorted_ready.sort();
    ready = sorted_ready.into();

    let mut remaining = in_degree.clone();
    let mut waves: Vec<Vec<String>> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();

    while !ready.is_empty() {
        let mut wave: Vec<&str> = ready.drain(..).collect();
        wave.sort();
        let mut next_ready: Vec<&str> = Vec::new();

        for &id in &wave {
            visited.insert(id);
            if let Some(children) = adjacency.get(id) {
                for &child in children {
                    let deg = remaining.get_mut(child).unwrap();
                    *deg -= 1;
                    if *deg == 0 {
                        next_ready.push(child);
                    }
                }
            }
        }

        waves.push(wave.into_iter().map(String::from).collect());
        next_ready.sort();
        ready = next_ready.into();
    }

    let mut stuck: Vec<&str> = in_degree
        .keys()
        .filter(|id| !visited.contains(*id))
        .copied()
        .collect();
    let had_cycle = !stuck.is_empty();
    if had_cycle {
        stuck.sort();
        waves.push(stuck.into_iter().map(String::from).collect());
    }

    Waves { waves, had_cycle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::task_graph::TaskNode;

    fn node(id: &str) -> TaskNode {
        TaskNode::new(id, "")
    }

    #[test]
    fn independent_nodes_land_in_one_wave() {
        let graph = TaskGraph {
            nodes: vec![node("a"), node("b")],
            edges: vec![],
        };
        let waves = build_waves(&graph);
        assert!(!waves.had_cycle);
        assert_eq!(waves.waves, vec![vec!["a".to_string(), "b".to_string()]]);
    }

    #[test]
    fn linear_chain_produces_one_wave_per_node() {
        let graph = TaskGraph {
            nodes: vec![node("a"), node("b"), node("c")],
            edges: vec![("a".into(), "b".into()), ("b".into(), "c".into())],
        };
        let waves = build_waves(&graph);
        assert_eq!(waves.waves, vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn diamond_dependency_waits_for_both_branches() {
        let graph = TaskGraph {
            nodes: vec![node("a"), node("b"), node("c"), node("d")],
            edges: vec![
                ("a".into(), "b".into()),
                ("a".into(), "c".into()),
                ("b".into(), "d".into()),
                ("c".into(), "d".into()),
            ],
        };
        let waves = build_waves(&graph);
        assert_eq!(
            waves.waves,
            vec![vec!["a".to_string()], vec!["b".to_string(), "c".to_string()], vec!["d".to_string()]]
        );
    }

    #[test]
    fn cycle_is_collapsed_into_a_final_wave_with_a_warning() {
        let graph = TaskGraph {
            nodes: vec![node("a"), node("b")],
            edges: vec![("a".into(), "b".into()), ("b".into(), "a".into())],
        };
        let waves = build_waves(&graph);
        assert!(waves.had_cycle);
        assert_eq!(waves.waves.len(), 1);
        assert_eq!(waves.waves[0], vec!["a".to_string(), "b".to_string()]);
    }
}
