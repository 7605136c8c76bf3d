//! Document assembly - structured graph to a directive stream
//!
//! Layout of the generated document:
//! ```text
//! <workflow-app xmlns name>
//!   <global>            workflow global, else config global
//!   <credentials>       config credentials, then workflow credentials
//!   …nodes…             depth-first from start
//!   <kill>              when configured
//!   <end>
//! ```

use std::path::Path;

use crate::ast::{Config, Workflow};
use crate::dag::{Dag, NodeKind, Transitions, WorkflowNode, END_NAME, START_NAME};
use crate::error::{Result, WeftError};

use super::directives::Directives;
use super::elements;

/// Build the directive stream for one workflow.
///
/// `base_dir` is where `@@file@@` references resolve.
pub fn build_document(
    workflow: &Workflow,
    config: &Config,
    graph: &Dag,
    base_dir: &Path,
) -> Result<Directives> {
    let mut d = Directives::new();

    d.add("workflow-app");
    if let Some(xmlns) = &workflow.xmlns {
        d.attr("xmlns", xmlns.as_str());
    }
    d.attr("name", workflow.name.as_str());

    if let Some(global) = workflow.global.as_ref().or(config.global.as_ref()) {
        elements::global(&mut d, global);
    }
    elements::credentials(&mut d, config.credentials.iter().chain(&workflow.credentials));

    let transitions = Transitions::new(graph, workflow);

    for name in graph.depth_first(START_NAME) {
        let Some(node) = graph.node(&name) else {
            continue;
        };

        match node {
            WorkflowNode::Start => elements::start(&mut d, transitions.successor(&name)?),
            WorkflowNode::Fork(_) => elements::fork(&mut d, &name, transitions.fork_paths(&name)),
            WorkflowNode::Join(_) => elements::join(&mut d, &name, transitions.successor(&name)?),
            WorkflowNode::Decision(decision) => {
                let resolved = transitions.decision(decision)?;
                elements::switch(
                    &mut d,
                    &decision.name,
                    resolved
                        .cases
                        .iter()
                        .map(|case| (case.to.as_str(), case.condition.as_str())),
                    &resolved.default_to,
                );
            }
            WorkflowNode::Step(step) => {
                let action_type = config.action_type(&step.action_type).ok_or_else(|| {
                    WeftError::UnknownActionType {
                        step: step.name.clone(),
                        action_type: step.action_type.clone(),
                    }
                })?;
                let routing = transitions.step(step, &action_type.default_interpolations)?;
                elements::action(&mut d, step, action_type, &routing, base_dir)?;
            }
            // Terminal nodes close the document
            WorkflowNode::End | WorkflowNode::Kill { .. } => {}
        }
    }

    if let Some(WorkflowNode::Kill { name, message }) = graph.nodes_of_kind(NodeKind::Kill).next() {
        elements::kill(&mut d, name, message);
    }
    elements::end(&mut d, END_NAME);

    d.up();
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ActionType, Step};
    use crate::dag::{build_input_graph, build_workflow_graph};
    use crate::emit::Directive;

    fn config() -> Config {
        Config {
            action_types: vec![ActionType {
                name: "shell".into(),
                tag: "shell".into(),
                ..Default::default()
            }],
            kill_name: Some("kill".into()),
            kill_message: Some("$$name$$ failed".into()),
            ..Default::default()
        }
    }

    fn document(wf: &Workflow, config: &Config) -> Result<Directives> {
        let input = build_input_graph(wf, config.kill().map(|(n, _)| n))?;
        let graph = build_workflow_graph(&input, wf, config)?;
        build_document(wf, config, &graph, Path::new("."))
    }

    fn top_level(d: &Directives) -> Vec<String> {
        let mut depth = 0usize;
        let mut out = Vec::new();
        for op in d {
            match op {
                Directive::Add(name) => {
                    if depth == 1 {
                        out.push(name.clone());
                    }
                    depth += 1;
                }
                Directive::Up => depth -= 1,
                _ => {}
            }
        }
        out
    }

    #[test]
    fn element_order() {
        let wf = Workflow {
            name: "w".into(),
            actions: vec![Step {
                name: "a".into(),
                action_type: "shell".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let d = document(&wf, &config()).unwrap();
        assert_eq!(top_level(&d), vec!["credentials", "start", "action", "kill", "end"]);
        assert!(d.iter().any(|op| *op == Directive::Set("w failed".into())));
    }

    #[test]
    fn unknown_action_type() {
        let wf = Workflow {
            name: "w".into(),
            actions: vec![Step {
                name: "a".into(),
                action_type: "nope".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(matches!(
            document(&wf, &config()),
            Err(WeftError::UnknownActionType { .. })
        ));
    }
}
