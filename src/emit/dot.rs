//! Graphviz export - DOT text for raw or structured graphs

use std::fmt::Write;

use crate::dag::{Dag, NodeKind};

fn shape(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Step => "box",
        NodeKind::Decision => "diamond",
        NodeKind::Fork => "triangle",
        NodeKind::Join => "invtriangle",
        NodeKind::Start | NodeKind::End => "circle",
        NodeKind::Kill => "octagon",
    }
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\\\""))
}

/// One line per node, then one line per edge, both in insertion order
pub fn to_dot(graph: &Dag, title: &str) -> String {
    let mut out = String::with_capacity(64 + graph.len() * 32);
    let _ = writeln!(out, "digraph {} {{", quote(title));

    for node in graph.nodes() {
        let _ = writeln!(out, "  {} [shape={}];", quote(node.name()), shape(node.kind()));
    }
    for (from, to) in graph.edges() {
        let _ = writeln!(out, "  {} -> {};", quote(from), quote(to));
    }

    out.push_str("}\n");
    out
}
