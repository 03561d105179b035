// src/dag/graph.rs

use petgraph::dot::{Config, Dot};
use petgraph::graphmap::DiGraphMap;

use crate::dag::collector::TaskCollection;

/// Render the collected tasks as a Graphviz DOT digraph.
///
/// Edge direction: dependency -> dependent. A task collected more than once
/// appears as a single node.
pub fn to_dot(tasks: &TaskCollection) -> String {
    let labels: Vec<(String, Vec<String>)> = tasks
        .all()
        .iter()
        .map(|t| {
            let deps = t.dependencies().iter().map(|d| d.to_string()).collect();
            (t.name().to_string(), deps)
        })
        .collect();

    let mut graph: DiGraphMap<&str, &str> = DiGraphMap::new();
    for (name, deps) in &labels {
        graph.add_node(name.as_str());
        for dep in deps {
            graph.add_edge(dep.as_str(), name.as_str(), "");
        }
    }

    format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
}
