//! Transition Resolution - ok/error targets per node
//!
//! Nothing here is stored on the graph; targets are computed on demand while
//! the emitter walks the structured graph.
//!
//! Error target precedence for a step:
//! 1. `forceError` (interpolated, `$$okTransition$$` available)
//! 2. the join of the enclosing fork/join region
//! 3. the workflow error handler, else the kill node, else `end`

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::warn;

use crate::ast::{Decision, DecisionCase, NamedArgs, Step, Workflow};
use crate::binding::interpolate;
use crate::error::{Result, WeftError};

use super::graph::Dag;
use super::node::{kill_rule_name, kill_switch_name, paired_join_name, NodeKind, END_NAME};

/// Decision gating a step with `onlyIf`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    /// Plain step name (what predecessors point at)
    pub name: String,
    pub condition: String,
    /// Prefixed name the action is emitted under
    pub to: String,
    /// Where a skipped step continues
    pub default_to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillRule {
    pub name: String,
    pub condition: String,
    pub message: String,
}

/// Decision placed after a step with `killIf` rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillSwitch {
    pub name: String,
    pub rules: Vec<KillRule>,
    pub default_to: String,
}

/// Everything the emitter needs to route one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTransitions {
    /// Value of `<ok to=…>`
    pub ok: String,
    /// Value of `<error to=…>`
    pub error: String,
    pub guard: Option<Guard>,
    pub kill_switch: Option<KillSwitch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTransitions {
    pub cases: Vec<DecisionCase>,
    pub default_to: String,
}

pub struct Transitions<'g> {
    graph: &'g Dag,
    error_handler: Option<&'g str>,
    /// Kill node if configured, else end
    terminal: String,
}

impl<'g> Transitions<'g> {
    pub fn new(graph: &'g Dag, workflow: &'g Workflow) -> Self {
        let terminal = graph
            .nodes_of_kind(NodeKind::Kill)
            .next()
            .map_or_else(|| END_NAME.to_string(), |kill| kill.name().to_string());

        Self {
            graph,
            error_handler: workflow.error_handler.as_ref().map(|h| h.name.as_str()),
            terminal,
        }
    }

    /// The single structural successor of `name`
    pub fn successor(&self, name: &str) -> Result<&'g str> {
        match self.graph.successors(name) {
            [only] => Ok(only.as_ref()),
            other => Err(WeftError::InvariantViolation {
                reason: format!("'{name}' has {} successors, expected 1", other.len()),
            }),
        }
    }

    /// Parallel paths leaving a fork
    pub fn fork_paths(&self, name: &str) -> &'g [Arc<str>] {
        self.graph.successors(name)
    }

    /// Error target when nothing more specific applies
    pub fn default_error_target(&self, name: &str) -> &str {
        match self.error_handler {
            Some(handler) if handler != name => handler,
            _ => &self.terminal,
        }
    }

    /// Join closing the innermost fork/join region around `name`, if any.
    ///
    /// Follows only the first incoming edge backwards (collecting forks) and
    /// the first outgoing edge forwards (collecting joins), then pairs them
    /// by numeric suffix. Nodes reached through a non-first edge of a
    /// merge point may therefore be missed.
    pub fn enclosing_join(&self, name: &str) -> Option<String> {
        if self.graph.in_degree(name) == 0 || self.graph.out_degree(name) == 0 {
            return None;
        }

        let mut forks: Vec<&str> = Vec::new();
        let mut current: &str = name;
        while let Some(prev) = self.graph.predecessors(current).first() {
            current = prev.as_ref();
            if self.kind(current) == Some(NodeKind::Fork) {
                forks.push(current);
            }
        }

        let mut joins: FxHashSet<&str> = FxHashSet::default();
        current = name;
        while let Some(next) = self.graph.successors(current).first() {
            current = next.as_ref();
            if self.kind(current) == Some(NodeKind::Join) {
                joins.insert(current);
            }
        }

        forks
            .into_iter()
            .filter_map(paired_join_name)
            .find(|join| joins.contains(join.as_str()))
    }

    /// Resolve routing for a step node.
    ///
    /// `defaults` are the action type's default interpolations.
    pub fn step(&self, step: &Step, defaults: &NamedArgs) -> Result<StepTransitions> {
        let structural = self.successor(&step.name)?;
        let continue_to = match &step.force_ok {
            Some(forced) => interpolate(forced, &step.named_args, defaults)?,
            None => structural.to_string(),
        };

        let error = match &step.force_error {
            Some(forced) => {
                let bindings = NamedArgs::from([("okTransition".to_string(), continue_to.clone())]);
                interpolate(forced, &bindings, defaults)?
            }
            None => self
                .enclosing_join(&step.name)
                .unwrap_or_else(|| self.default_error_target(&step.name).to_string()),
        };

        let display = step.display_name();
        let guard = step.only_if.as_ref().map(|condition| Guard {
            name: step.name.clone(),
            condition: condition.clone(),
            to: display.clone(),
            default_to: continue_to.clone(),
        });

        let kill_switch = (!step.kill_if.is_empty()).then(|| KillSwitch {
            name: kill_switch_name(&display),
            rules: step
                .kill_if
                .iter()
                .enumerate()
                .map(|(i, rule)| KillRule {
                    name: kill_rule_name(i, &display),
                    condition: rule.condition.clone(),
                    message: rule.message.clone(),
                })
                .collect(),
            default_to: continue_to.clone(),
        });

        let ok = kill_switch
            .as_ref()
            .map_or_else(|| continue_to.clone(), |switch| switch.name.clone());

        Ok(StepTransitions {
            ok,
            error,
            guard,
            kill_switch,
        })
    }

    /// Resolve cases and default for a user decision
    pub fn decision(&self, decision: &Decision) -> Result<DecisionTransitions> {
        let default_to = match &decision.default_to {
            Some(target) => target.clone(),
            None => self.successor(&decision.name)?.to_string(),
        };

        let cases = decision.cases();
        for target in cases.iter().map(|c| c.to.as_str()).chain([default_to.as_str()]) {
            if !self.graph.contains(target) {
                warn!(decision = %decision.name, target, "decision target names no node");
            }
        }

        Ok(DecisionTransitions { cases, default_to })
    }

    fn kind(&self, name: &str) -> Option<NodeKind> {
        self.graph.node(name).map(|node| node.kind())
    }
}
