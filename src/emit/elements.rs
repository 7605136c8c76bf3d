//! Element builders - one function per emitted XML construct
//!
//! Each builder appends a balanced run of directives (every `add` closed by
//! an `up`) so builders compose in any order.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::ast::{ActionType, ArgMap, Credential, Global, PrepareOp, Step};
use crate::binding::{interpolate, interpolate_args, interpolate_files};
use crate::dag::{Guard, KillSwitch, StepTransitions};
use crate::error::Result;

use super::directives::Directives;

pub fn start(d: &mut Directives, to: &str) {
    d.add("start").attr("to", to).up();
}

pub fn end(d: &mut Directives, name: &str) {
    d.add("end").attr("name", name).up();
}

pub fn kill(d: &mut Directives, name: &str, message: &str) {
    d.add("kill").attr("name", name).text_element("message", message).up();
}

pub fn fork(d: &mut Directives, name: &str, paths: &[Arc<str>]) {
    d.add("fork").attr("name", name);
    for path in paths {
        d.add("path").attr("start", path.as_ref()).up();
    }
    d.up();
}

pub fn join(d: &mut Directives, name: &str, to: &str) {
    d.add("join").attr("name", name).attr("to", to).up();
}

/// `<decision><switch>` with `(target, condition)` cases
pub fn switch<'a>(
    d: &mut Directives,
    name: &str,
    cases: impl IntoIterator<Item = (&'a str, &'a str)>,
    default_to: &str,
) {
    d.add("decision").attr("name", name).add("switch");
    for (to, condition) in cases {
        d.add("case").attr("to", to).set(condition).up();
    }
    d.add("default").attr("to", default_to).up();
    d.up().up();
}

/// Property list wrapped in `tag`; nothing at all when empty
pub fn configuration(
    d: &mut Directives,
    tag: &str,
    attrs: &[(&str, &str)],
    properties: &IndexMap<String, String>,
) {
    if properties.is_empty() {
        return;
    }

    d.add(tag);
    for (key, value) in attrs {
        d.attr(*key, *value);
    }
    for (name, value) in properties {
        d.add("property")
            .text_element("name", name.as_str())
            .text_element("value", value.as_str())
            .up();
    }
    d.up();
}

/// Always emitted, even with no credentials
pub fn credentials<'a>(d: &mut Directives, credentials: impl IntoIterator<Item = &'a Credential>) {
    d.add("credentials");
    for credential in credentials {
        configuration(
            d,
            "credential",
            &[
                ("name", credential.name.as_str()),
                ("type", credential.credential_type.as_str()),
            ],
            &credential.properties,
        );
    }
    d.up();
}

pub fn prepare(d: &mut Directives, ops: &[PrepareOp]) {
    if ops.is_empty() {
        return;
    }

    d.add("prepare");
    for op in ops {
        d.add(op.op.as_str()).attr("path", op.path.as_str()).up();
    }
    d.up();
}

/// Argument entries with `<prepare>` and `<configuration>` spliced in.
///
/// Each block goes before the entry at its position, or after the last
/// entry when the position is past the end. Prepare precedes configuration
/// when both land on the same slot.
pub fn inner_elements(
    d: &mut Directives,
    entries: &ArgMap,
    properties: &IndexMap<String, String>,
    configuration_position: usize,
    prepare_ops: &[PrepareOp],
    prepare_position: usize,
) {
    for (i, (key, values)) in entries.iter().enumerate() {
        if prepare_position == i {
            prepare(d, prepare_ops);
        }
        if configuration_position == i {
            configuration(d, "configuration", &[], properties);
        }
        for value in values {
            d.text_element(key, value.as_str());
        }
    }

    if prepare_position >= entries.len() {
        prepare(d, prepare_ops);
    }
    if configuration_position >= entries.len() {
        configuration(d, "configuration", &[], properties);
    }
}

pub fn global(d: &mut Directives, global: &Global) {
    d.add("global");
    inner_elements(
        d,
        &global.default_args,
        &global.properties,
        global.configuration_position,
        &[],
        usize::MAX,
    );
    d.up();
}

/// Materialized argument entries for a step
///
/// Type defaults interpolated against the step, then positional args the
/// defaults did not splice in, then file references.
pub fn step_entries(step: &Step, action_type: &ActionType, base_dir: &Path) -> Result<ArgMap> {
    let interpolated = interpolate_args(
        &action_type.default_args,
        &step.named_args,
        &action_type.default_interpolations,
        &step.positional_args,
    )?;

    let mut entries = interpolated.args.clone();
    for (key, values) in interpolated.remaining(&step.positional_args) {
        entries
            .entry(key.clone())
            .or_default()
            .extend(values.iter().cloned());
    }

    interpolate_files(base_dir, &entries)
}

/// Type prepare ops followed by step prepare ops, paths interpolated
pub fn step_prepare(step: &Step, action_type: &ActionType) -> Result<Vec<PrepareOp>> {
    action_type
        .prepare_ops()
        .into_iter()
        .chain(step.prepare_ops())
        .map(|op| -> Result<PrepareOp> {
            let path = interpolate(&op.path, &step.named_args, &action_type.default_interpolations)?;
            Ok(PrepareOp { op: op.op, path })
        })
        .collect()
}

/// Full action block: guard, comment, `<action>`, kill switch
pub fn action(
    d: &mut Directives,
    step: &Step,
    action_type: &ActionType,
    transitions: &StepTransitions,
    base_dir: &Path,
) -> Result<()> {
    if let Some(guard) = &transitions.guard {
        guard_switch(d, guard);
    }

    if let Some(comment) = &step.comment {
        d.comment(comment.as_str());
    }

    d.add("action").attr("name", step.display_name());
    d.attr_first("cred", [step.cred.as_deref(), action_type.cred.as_deref()]);
    d.attr_first("retry-max", [step.retry_max, action_type.retry_max]);
    d.attr_first("retry-interval", [step.retry_interval, action_type.retry_interval]);

    d.add(action_type.tag.as_str());
    if let Some(xmlns) = &action_type.xmlns {
        d.attr("xmlns", xmlns.as_str());
    }

    for (elem, attrs) in &step.elem {
        d.add(elem.as_str());
        for (key, value) in attrs {
            d.attr(key.as_str(), value.as_str());
        }
        d.up();
    }

    let entries = step_entries(step, action_type, base_dir)?;
    let prepare_ops = step_prepare(step, action_type)?;
    let mut properties = action_type.properties.clone();
    properties.extend(step.properties.iter().map(|(k, v)| (k.clone(), v.clone())));

    inner_elements(
        d,
        &entries,
        &properties,
        action_type.configuration_position,
        &prepare_ops,
        action_type.prepare_position,
    );
    d.up();

    d.add("ok").attr("to", transitions.ok.as_str()).up();
    d.add("error").attr("to", transitions.error.as_str()).up();
    d.up();

    if let Some(switch) = &transitions.kill_switch {
        kill_switch(d, switch);
    }

    Ok(())
}

fn guard_switch(d: &mut Directives, guard: &Guard) {
    switch(
        d,
        &guard.name,
        [(guard.to.as_str(), guard.condition.as_str())],
        &guard.default_to,
    );
}

fn kill_switch(d: &mut Directives, switch_node: &KillSwitch) {
    switch(
        d,
        &switch_node.name,
        switch_node
            .rules
            .iter()
            .map(|rule| (rule.name.as_str(), rule.condition.as_str())),
        &switch_node.default_to,
    );
    for rule in &switch_node.rules {
        kill(d, &rule.name, &rule.message);
    }
}
