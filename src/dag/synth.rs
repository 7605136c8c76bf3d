//! Control-Flow Synthesis - raw DAG to structured graph
//!
//! The target engine only runs single-successor chains and balanced
//! fork/join blocks. Synthesis peels the graph layer by layer:
//!
//! ```text
//! process_subcomponents(g)
//!   ├─ one weakly connected component  → build_component_graph(c)
//!   └─ several components              → fork → [each component] → join
//!
//! build_component_graph(c)
//!   ├─ ready = nodes with in-degree 0 inside c
//!   ├─ |ready| = 1  → that node alone
//!   ├─ |ready| > 1  → fork → [each ready node] → join
//!   └─ chain layer exit → process_subcomponents(c - ready).entry
//! ```
//!
//! Layers of one component are peeled in a loop. Nesting only happens when
//! the remainder splits into several components, and it lives on an explicit
//! stack of [`Pending`] continuations rather than the call stack. Every node
//! is moved once into a single output graph.

use std::sync::Arc;

use tracing::debug;

use crate::ast::{Config, NamedArgs, Workflow};
use crate::binding::interpolate;
use crate::error::{Result, WeftError};

use super::graph::Dag;
use super::node::{
    make_end, make_kill, make_start, paired_join_name, ForkJoinCounter, NodeKind, WorkflowNode,
};

/// A structured (sub)graph with its single entry and single exit
#[derive(Debug, Clone)]
pub struct Structured {
    pub graph: Dag,
    pub entry: Arc<str>,
    pub exit: Arc<str>,
}

/// Owns the fork/join counter for one workflow
#[derive(Debug, Default)]
pub struct Synthesizer {
    counter: ForkJoinCounter,
}

/// Work still to do once the subgraph being built is finished
enum Pending {
    /// Leading layers of a component waiting for its structured remainder
    Chain { entry: Arc<str>, exit: Arc<str> },
    /// Sibling components still queued, and the ends of those already built
    Components {
        queue: std::vec::IntoIter<Dag>,
        ends: Vec<(Arc<str>, Arc<str>)>,
    },
}

enum Flow {
    Split(Dag),
    Peel(Dag),
    Done(Arc<str>, Arc<str>),
}

impl Synthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fork/join pairs inserted so far
    pub fn pairs_issued(&self) -> usize {
        self.counter.issued()
    }

    /// Structure every weakly connected component of `graph`, running them
    /// in parallel when there is more than one.
    pub fn process_subcomponents(&mut self, graph: &Dag) -> Result<Structured> {
        self.run(Flow::Split(graph.clone()))
    }

    /// Structure one connected component (given as its induced subgraph)
    pub fn build_component_graph(&mut self, component: Dag) -> Result<Structured> {
        self.run(Flow::Peel(component))
    }

    fn run(&mut self, start: Flow) -> Result<Structured> {
        let mut out = Dag::new();
        let mut pending: Vec<Pending> = Vec::new();
        let mut flow = start;

        loop {
            flow = match flow {
                Flow::Split(graph) => split(graph, &mut pending)?,
                Flow::Peel(component) => self.peel(component, &mut out, &mut pending)?,
                Flow::Done(entry, exit) => match pending.pop() {
                    None => {
                        return Ok(Structured {
                            graph: out,
                            entry,
                            exit,
                        })
                    }
                    Some(Pending::Chain {
                        entry: first,
                        exit: layer_exit,
                    }) => {
                        out.add_edge(&layer_exit, &entry)?;
                        Flow::Done(first, exit)
                    }
                    Some(Pending::Components { mut queue, mut ends }) => {
                        ends.push((entry, exit));
                        match queue.next() {
                            Some(next) => {
                                pending.push(Pending::Components { queue, ends });
                                Flow::Peel(next)
                            }
                            None => self.join_components(&mut out, &ends)?,
                        }
                    }
                },
            };
        }
    }

    /// Peel layers off one component until it is used up or falls apart
    fn peel(&mut self, mut component: Dag, out: &mut Dag, pending: &mut Vec<Pending>) -> Result<Flow> {
        if component.is_empty() {
            return Err(WeftError::InvariantViolation {
                reason: "cannot structure an empty graph".to_string(),
            });
        }

        let (entry, mut exit) = self.layer(&mut component, out)?;
        loop {
            if component.is_empty() {
                return Ok(Flow::Done(entry, exit));
            }
            if component.connected_components().len() > 1 {
                pending.push(Pending::Chain { entry, exit });
                return Ok(Flow::Split(component));
            }

            let (layer_entry, layer_exit) = self.layer(&mut component, out)?;
            out.add_edge(&exit, &layer_entry)?;
            exit = layer_exit;
        }
    }

    /// Move the ready nodes of `component` into `out`, behind a fork/join
    /// pair when there is more than one
    fn layer(&mut self, component: &mut Dag, out: &mut Dag) -> Result<(Arc<str>, Arc<str>)> {
        let ready: Vec<Arc<str>> = component.sources().cloned().collect();

        match ready.as_slice() {
            [] => Err(WeftError::InvariantViolation {
                reason: "component has no node with in-degree 0".to_string(),
            }),
            [only] => {
                let name = out.add_node(take(component, only)?)?;
                Ok((Arc::clone(&name), name))
            }
            _ => {
                let (fork, join) = self.counter.next_pair();
                debug!(fork = fork.name(), width = ready.len(), "parallel layer");
                let fork = out.add_node(fork)?;
                let join = out.add_node(join)?;
                for name in &ready {
                    out.add_node(take(component, name)?)?;
                    out.add_edge(&fork, name)?;
                    out.add_edge(name, &join)?;
                }
                Ok((fork, join))
            }
        }
    }

    fn join_components(&mut self, out: &mut Dag, ends: &[(Arc<str>, Arc<str>)]) -> Result<Flow> {
        let (fork, join) = self.counter.next_pair();
        debug!(fork = fork.name(), components = ends.len(), "parallel components");
        let fork = out.add_node(fork)?;
        let join = out.add_node(join)?;

        for (entry, exit) in ends {
            out.add_edge(&fork, entry)?;
            out.add_edge(exit, &join)?;
        }

        Ok(Flow::Done(fork, join))
    }
}

/// One component goes straight to peeling; several are queued in order
fn split(graph: Dag, pending: &mut Vec<Pending>) -> Result<Flow> {
    let components = graph.connected_components();
    if components.len() <= 1 {
        return Ok(Flow::Peel(graph));
    }

    let mut queue = components
        .iter()
        .map(|members| graph.induced_subgraph(members))
        .collect::<Vec<_>>()
        .into_iter();
    let first = queue.next().ok_or_else(|| WeftError::InvariantViolation {
        reason: "component list vanished during synthesis".to_string(),
    })?;

    pending.push(Pending::Components {
        queue,
        ends: Vec::with_capacity(components.len()),
    });
    Ok(Flow::Peel(first))
}

fn take(graph: &mut Dag, name: &str) -> Result<WorkflowNode> {
    graph
        .remove_node(name)
        .ok_or_else(|| WeftError::InvariantViolation {
            reason: format!("node '{name}' vanished during synthesis"),
        })
}

/// Build the complete structured graph for one workflow.
///
/// ```text
/// start → [structured input graph] → [error handler] → end      kill (detached)
/// ```
///
/// The fork/join counter starts at 0 for every call.
pub fn build_workflow_graph(input: &Dag, workflow: &Workflow, config: &Config) -> Result<Dag> {
    let mut synthesizer = Synthesizer::new();

    let (mut graph, body) = if input.is_empty() {
        (Dag::new(), None)
    } else {
        let structured = synthesizer.process_subcomponents(input)?;
        (structured.graph, Some((structured.entry, structured.exit)))
    };

    let start = graph.add_node(make_start())?;
    let end = graph.add_node(make_end())?;

    let tail = match body {
        Some((entry, exit)) => {
            graph.add_edge(&start, &entry)?;
            exit
        }
        None => Arc::clone(&start),
    };

    match &workflow.error_handler {
        Some(handler) => {
            let handler = graph.add_node(WorkflowNode::step(handler.clone()))?;
            graph.add_edge(&tail, &handler)?;
            graph.add_edge(&handler, &end)?;
        }
        None => {
            graph.add_edge(&tail, &end)?;
        }
    }

    if let Some((name, message)) = config.kill() {
        let bindings = NamedArgs::from([("name".to_string(), workflow.name.clone())]);
        let message = interpolate(message, &bindings, &NamedArgs::new())?;
        graph.add_node(make_kill(name, message))?;
    }

    debug!(
        workflow = %workflow.name,
        nodes = graph.len(),
        forks = synthesizer.pairs_issued(),
        "synthesized"
    );

    check_structure(&graph)?;
    Ok(graph)
}

/// Verify the shape every structured graph must have
pub fn check_structure(graph: &Dag) -> Result<()> {
    let violation = |reason: String| Err(WeftError::InvariantViolation { reason });

    let starts = graph.nodes_of_kind(NodeKind::Start).count();
    let ends = graph.nodes_of_kind(NodeKind::End).count();
    let kills = graph.nodes_of_kind(NodeKind::Kill).count();
    if starts != 1 {
        return violation(format!("expected one start node, found {starts}"));
    }
    if ends != 1 {
        return violation(format!("expected one end node, found {ends}"));
    }
    if kills > 1 {
        return violation(format!("expected at most one kill node, found {kills}"));
    }

    for node in graph.nodes() {
        let name = node.name();
        let (fan_in, fan_out) = (graph.in_degree(name), graph.out_degree(name));
        match node.kind() {
            NodeKind::Start if fan_in != 0 || fan_out != 1 => {
                return violation(format!("start has in/out degree {fan_in}/{fan_out}"));
            }
            NodeKind::End if fan_out != 0 => {
                return violation("end has outgoing edges".to_string());
            }
            NodeKind::Kill if fan_in != 0 || fan_out != 0 => {
                return violation(format!("kill node '{name}' is connected"));
            }
            NodeKind::Fork => {
                if fan_out < 2 {
                    return violation(format!("fork '{name}' has out-degree {fan_out}"));
                }
                let paired = paired_join_name(name).is_some_and(|join| {
                    graph.node(&join).map(WorkflowNode::kind) == Some(NodeKind::Join)
                });
                if !paired {
                    return violation(format!("fork '{name}' has no matching join"));
                }
            }
            NodeKind::Join if fan_in < 2 || fan_out != 1 => {
                return violation(format!("join '{name}' has in/out degree {fan_in}/{fan_out}"));
            }
            NodeKind::Step | NodeKind::Decision if fan_out != 1 => {
                return violation(format!("'{name}' has out-degree {fan_out}, expected 1"));
            }
            _ => {}
        }
    }

    Ok(())
}
