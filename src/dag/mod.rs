//! DAG Module - graph model and control-flow synthesis
//!
//! Pipeline:
//! ```text
//! Workflow ─→ build_input_graph ─→ raw Dag ─→ build_workflow_graph ─→ structured Dag
//!                                                                        │
//!                                               Transitions (ok/error) ←─┘
//! ```
//!
//! - `node`: `WorkflowNode` variants and fork/join naming
//! - `graph`: `Dag` storage, traversal, components, subgraphs
//! - `input`: raw dependency graph with name and cycle checks
//! - `synth`: recursive fork/join insertion plus start/end/kill assembly
//! - `transition`: per-node ok/error targets, guards, conditional kills

mod graph;
mod input;
mod node;
mod synth;
mod transition;

pub use graph::{Dag, DepVec};
pub use input::build_input_graph;
pub use node::{
    kill_rule_name, kill_switch_name, make_end, make_kill, make_start, paired_join_name,
    ForkJoinCounter, NodeKind, WorkflowNode, END_NAME, FORK_PREFIX, JOIN_PREFIX, START_NAME,
};
pub use synth::{build_workflow_graph, check_structure, Structured, Synthesizer};
pub use transition::{
    DecisionTransitions, Guard, KillRule, KillSwitch, StepTransitions, Transitions,
};
