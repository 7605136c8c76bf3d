//! Input Graph - the raw dependency DAG
//!
//! One vertex per declared action and decision, one edge `dep -> node` per
//! declared dependency. Cycles are rejected edge by edge as they appear.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

use crate::ast::{Step, Workflow};
use crate::error::{Result, WeftError};

use super::graph::Dag;
use super::node::{kill_rule_name, kill_switch_name, WorkflowNode, END_NAME, START_NAME};

/// No whitespace, quotes or XML metacharacters
static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^[^\s"'<>&]+$"#).unwrap());

/// Names the synthesizer hands out to fork/join pairs
static SYNTHETIC_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(fork|join)-\d+$").unwrap());

/// Build the raw dependency graph of a workflow.
///
/// `kill_name` is the configured kill node name, reserved alongside `start`,
/// `end` and the fork/join names.
pub fn build_input_graph(workflow: &Workflow, kill_name: Option<&str>) -> Result<Dag> {
    check_names(workflow, kill_name)?;

    let mut graph = Dag::new();

    // All vertices first so dependency order in the file does not matter
    for step in &workflow.actions {
        graph.add_node(WorkflowNode::step(step.clone()))?;
    }
    for decision in &workflow.decisions {
        graph.add_node(WorkflowNode::decision(decision.clone()))?;
    }

    let declared = workflow
        .actions
        .iter()
        .map(|s| (s.name.as_str(), s.dependencies.as_slice()))
        .chain(
            workflow
                .decisions
                .iter()
                .map(|d| (d.name.as_str(), d.dependencies.as_slice())),
        );

    for (name, dependencies) in declared {
        for dependency in dependencies {
            if !graph.contains(dependency) {
                return Err(WeftError::MissingDependency {
                    node: name.to_string(),
                    dependency: dependency.clone(),
                });
            }
            graph.add_edge(dependency, name)?;
        }
    }

    Ok(graph)
}

/// Declared names, plus the names emitted for guards and kill switches, must
/// be unique and clear of the reserved names.
fn check_names(workflow: &Workflow, kill_name: Option<&str>) -> Result<()> {
    let emitted: Vec<String> = workflow
        .actions
        .iter()
        .chain(&workflow.error_handler)
        .flat_map(emitted_names)
        .collect();

    let declared = workflow
        .actions
        .iter()
        .map(|s| s.name.as_str())
        .chain(workflow.decisions.iter().map(|d| d.name.as_str()))
        .chain(workflow.error_handler.iter().map(|h| h.name.as_str()));

    let is_reserved = |name: &str| {
        name == START_NAME
            || name == END_NAME
            || kill_name == Some(name)
            || SYNTHETIC_PATTERN.is_match(name)
    };

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for name in declared {
        if !NAME_PATTERN.is_match(name) {
            return Err(WeftError::InvalidNodeName {
                name: name.to_string(),
            });
        }
        if is_reserved(name) || !seen.insert(name) {
            return Err(WeftError::DuplicateNode {
                name: name.to_string(),
            });
        }
    }

    for name in &emitted {
        if is_reserved(name) || !seen.insert(name.as_str()) {
            return Err(WeftError::DuplicateNode { name: name.clone() });
        }
    }

    Ok(())
}

/// Names a step emits besides its own: the `?-` action behind a guard, the
/// kill-switch decision and one kill node per `killIf` rule
fn emitted_names(step: &Step) -> Vec<String> {
    let display = step.display_name();
    let mut names = Vec::with_capacity(step.kill_if.len() + 2);
    if step.only_if.is_some() {
        names.push(display.clone());
    }
    if !step.kill_if.is_empty() {
        names.push(kill_switch_name(&display));
        names.extend((0..step.kill_if.len()).map(|i| kill_rule_name(i, &display)));
    }
    names
}
