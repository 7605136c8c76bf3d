//! Workflow Types - the declarative workflow file
//!
//! Contains the YAML-parsed types:
//! - `Workflow`: root with actions, decisions, credentials, error handler
//! - `Step`: one unit of work bound to an action type
//! - `Decision`: user-declared branch node
//!
//! Maps are `IndexMap` throughout: argument order in YAML is element order
//! in the generated XML.

use indexmap::IndexMap;
use serde::Deserialize;

/// Argument name -> ordered values (`positionalArgs`, `defaultArgs`)
pub type ArgMap = IndexMap<String, Vec<String>>;

/// Argument name -> single value (`namedArgs`, `defaultInterpolations`)
pub type NamedArgs = IndexMap<String, String>;

/// Workflow parsed from YAML
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub name: String,
    #[serde(default)]
    pub xmlns: Option<String>,
    #[serde(default, alias = "steps")]
    pub actions: Vec<Step>,
    #[serde(default)]
    pub decisions: Vec<Decision>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
    #[serde(default)]
    pub error_handler: Option<Step>,
    #[serde(default)]
    pub global: Option<Global>,
}

/// A conditional kill rule: when `condition` holds after the step, kill with `message`
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ConditionalKill {
    pub condition: String,
    pub message: String,
}

/// A step (Oozie action) as declared in YAML
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub name: String,
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub cred: Option<String>,
    #[serde(default)]
    pub retry_max: Option<u32>,
    #[serde(default)]
    pub retry_interval: Option<u32>,
    #[serde(default)]
    pub force_ok: Option<String>,
    #[serde(default)]
    pub force_error: Option<String>,
    #[serde(default)]
    pub positional_args: ArgMap,
    #[serde(default)]
    pub named_args: NamedArgs,
    #[serde(default, alias = "configurationProperties")]
    pub properties: IndexMap<String, String>,
    #[serde(default)]
    pub only_if: Option<String>,
    #[serde(default)]
    pub kill_if: Vec<ConditionalKill>,
    #[serde(default)]
    pub comment: Option<String>,
    /// `- delete: /path` / `- mkdir: /path`
    #[serde(default)]
    pub prepare: Vec<IndexMap<String, String>>,
    /// Extra empty child elements: element name -> attributes
    #[serde(default)]
    pub elem: IndexMap<String, IndexMap<String, String>>,
}

impl Step {
    /// Name the action element is emitted under.
    ///
    /// A guarded step is wrapped by a decision that takes the plain name,
    /// so the action itself moves to `?-<name>`.
    pub fn display_name(&self) -> String {
        if self.only_if.is_some() {
            format!("?-{}", self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn prepare_ops(&self) -> Vec<PrepareOp> {
        PrepareOp::flatten(&self.prepare)
    }
}

/// One filesystem operation inside `<prepare>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareOp {
    pub op: String,
    pub path: String,
}

impl PrepareOp {
    pub fn flatten(entries: &[IndexMap<String, String>]) -> Vec<PrepareOp> {
        entries
            .iter()
            .flat_map(|entry| {
                entry.iter().map(|(op, path)| PrepareOp {
                    op: op.clone(),
                    path: path.clone(),
                })
            })
            .collect()
    }
}

/// A user-declared decision node
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub name: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Each entry is `{target: condition}`
    #[serde(default)]
    pub cases: Vec<IndexMap<String, String>>,
    #[serde(default)]
    pub default_to: Option<String>,
}

/// A decision case flattened out of its YAML map form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionCase {
    pub condition: String,
    pub to: String,
}

impl Decision {
    /// Cases in declaration order
    pub fn cases(&self) -> Vec<DecisionCase> {
        self.cases
            .iter()
            .flat_map(|entry| {
                entry.iter().map(|(to, condition)| DecisionCase {
                    condition: condition.clone(),
                    to: to.clone(),
                })
            })
            .collect()
    }
}

/// Credential declaration (workflow- or config-level)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Credential {
    pub name: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
}

/// The `<global>` block
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Global {
    #[serde(default)]
    pub default_args: ArgMap,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
    #[serde(default = "default_global_configuration_position")]
    pub configuration_position: usize,
}

fn default_global_configuration_position() -> usize {
    3
}

impl Default for Global {
    fn default() -> Self {
        Self {
            default_args: ArgMap::new(),
            properties: IndexMap::new(),
            configuration_position: default_global_configuration_position(),
        }
    }
}
