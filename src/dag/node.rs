//! Node Model - typed graph vertices
//!
//! User-declared steps and decisions are shared behind `Arc` so subgraph
//! copies during synthesis stay cheap. Synthetic control nodes carry only
//! what they emit.

use std::fmt;
use std::sync::Arc;

use crate::ast::{Decision, Step};

pub const START_NAME: &str = "start";
pub const END_NAME: &str = "end";
pub const FORK_PREFIX: &str = "fork-";
pub const JOIN_PREFIX: &str = "join-";

/// Variant tag of a [`WorkflowNode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Step,
    Decision,
    Fork,
    Join,
    Start,
    End,
    Kill,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Step => "step",
            NodeKind::Decision => "decision",
            NodeKind::Fork => "fork",
            NodeKind::Join => "join",
            NodeKind::Start => "start",
            NodeKind::End => "end",
            NodeKind::Kill => "kill",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowNode {
    Step(Arc<Step>),
    Decision(Arc<Decision>),
    Fork(Arc<str>),
    Join(Arc<str>),
    Start,
    End,
    Kill { name: Arc<str>, message: String },
}

impl WorkflowNode {
    pub fn step(step: Step) -> Self {
        WorkflowNode::Step(Arc::new(step))
    }

    pub fn decision(decision: Decision) -> Self {
        WorkflowNode::Decision(Arc::new(decision))
    }

    /// Graph identity
    pub fn name(&self) -> &str {
        match self {
            WorkflowNode::Step(step) => &step.name,
            WorkflowNode::Decision(decision) => &decision.name,
            WorkflowNode::Fork(name) | WorkflowNode::Join(name) => name,
            WorkflowNode::Start => START_NAME,
            WorkflowNode::End => END_NAME,
            WorkflowNode::Kill { name, .. } => name,
        }
    }

    /// Name the node is emitted under (differs from `name` for guarded steps)
    pub fn display_name(&self) -> String {
        match self {
            WorkflowNode::Step(step) => step.display_name(),
            other => other.name().to_string(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            WorkflowNode::Step(_) => NodeKind::Step,
            WorkflowNode::Decision(_) => NodeKind::Decision,
            WorkflowNode::Fork(_) => NodeKind::Fork,
            WorkflowNode::Join(_) => NodeKind::Join,
            WorkflowNode::Start => NodeKind::Start,
            WorkflowNode::End => NodeKind::End,
            WorkflowNode::Kill { .. } => NodeKind::Kill,
        }
    }

    /// Declared dependencies; empty for synthetic nodes
    pub fn dependencies(&self) -> &[String] {
        match self {
            WorkflowNode::Step(step) => &step.dependencies,
            WorkflowNode::Decision(decision) => &decision.dependencies,
            _ => &[],
        }
    }
}

/// Hands out fork/join pairs sharing a numeric suffix.
///
/// Owned by one synthesis run; a fresh workflow starts again at 0.
#[derive(Debug, Default)]
pub struct ForkJoinCounter {
    next: usize,
}

impl ForkJoinCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_pair(&mut self) -> (WorkflowNode, WorkflowNode) {
        let n = self.next;
        self.next += 1;
        (
            WorkflowNode::Fork(Arc::from(format!("{FORK_PREFIX}{n}"))),
            WorkflowNode::Join(Arc::from(format!("{JOIN_PREFIX}{n}"))),
        )
    }

    pub fn issued(&self) -> usize {
        self.next
    }
}

pub fn make_start() -> WorkflowNode {
    WorkflowNode::Start
}

pub fn make_end() -> WorkflowNode {
    WorkflowNode::End
}

pub fn make_kill(name: &str, message: impl Into<String>) -> WorkflowNode {
    WorkflowNode::Kill {
        name: Arc::from(name),
        message: message.into(),
    }
}

/// Decision that routes a step with `killIf` rules
pub fn kill_switch_name(display_name: &str) -> String {
    format!("ki-{display_name}")
}

/// Kill node for the `index`-th `killIf` rule of a step
pub fn kill_rule_name(index: usize, display_name: &str) -> String {
    format!("k{index}-{display_name}")
}

/// `fork-N` -> `join-N`.
///
/// Pairing is purely by name; anything that renames synthetic nodes breaks it.
pub fn paired_join_name(fork_name: &str) -> Option<String> {
    fork_name
        .strip_prefix(FORK_PREFIX)
        .map(|suffix| format!("{JOIN_PREFIX}{suffix}"))
}
