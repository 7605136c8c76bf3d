//! Configuration Types - action type definitions and global settings
//!
//! A run may load many config files; `crate::config::merge` folds them into
//! one `Config` before any workflow is compiled.

use indexmap::IndexMap;
use serde::Deserialize;

use super::workflow::{ArgMap, Credential, Global, NamedArgs, PrepareOp};

/// One config file (or the merged result of many)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub action_types: Vec<ActionType>,
    #[serde(default)]
    pub kill_name: Option<String>,
    #[serde(default)]
    pub kill_message: Option<String>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
    #[serde(default)]
    pub global: Option<Global>,
}

impl Config {
    /// Mark every action type in this file as low precedence (or not)
    pub fn set_low_precedence(&mut self, low: bool) {
        for action_type in &mut self.action_types {
            action_type.low_precedence = low;
        }
    }

    pub fn action_type(&self, name: &str) -> Option<&ActionType> {
        self.action_types.iter().find(|a| a.name == name)
    }

    /// Kill node name and message, only when both are configured
    pub fn kill(&self) -> Option<(&str, &str)> {
        match (self.kill_name.as_deref(), self.kill_message.as_deref()) {
            (Some(name), Some(message)) => Some((name, message)),
            _ => None,
        }
    }
}

/// How a step `type` maps onto an Oozie action element
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionType {
    pub name: String,
    pub tag: String,
    #[serde(default)]
    pub xmlns: Option<String>,
    #[serde(default)]
    pub cred: Option<String>,
    #[serde(default)]
    pub retry_max: Option<u32>,
    #[serde(default)]
    pub retry_interval: Option<u32>,
    #[serde(default)]
    pub default_args: ArgMap,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
    #[serde(default)]
    pub default_interpolations: NamedArgs,
    #[serde(default)]
    pub configuration_position: usize,
    #[serde(default)]
    pub prepare_position: usize,
    #[serde(default)]
    pub prepare: Vec<IndexMap<String, String>>,
    #[serde(skip)]
    pub low_precedence: bool,
}

impl ActionType {
    pub fn prepare_ops(&self) -> Vec<PrepareOp> {
        PrepareOp::flatten(&self.prepare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
killName: kill
killMessage: "Workflow $$name$$ failed"
actionTypes:
  - tag: testaction
    name: test
    xmlns: "uri:oozie:test-action:0.1"
    configurationPosition: 1
    defaultArgs:
      a: [a, b, c]
    properties:
      p1: v1
      p2: v2
"#;

    #[test]
    fn parse_config_file() {
        let config: Config = serde_yaml::from_str(CONFIG).unwrap();
        let test = config.action_type("test").unwrap();
        assert_eq!(test.tag, "testaction");
        assert_eq!(test.configuration_position, 1);
        assert_eq!(test.prepare_position, 0);
        assert_eq!(test.default_args["a"], vec!["a", "b", "c"]);
        assert_eq!(config.kill(), Some(("kill", "Workflow $$name$$ failed")));
        assert!(!test.low_precedence);
    }

    #[test]
    fn low_precedence_marks_every_action_type() {
        let mut config: Config = serde_yaml::from_str(CONFIG).unwrap();
        config.set_low_precedence(true);
        assert!(config.action_types.iter().all(|a| a.low_precedence));
    }

    #[test]
    fn kill_requires_both_name_and_message() {
        let config = Config {
            kill_name: Some("kill".into()),
            ..Default::default()
        };
        assert_eq!(config.kill(), None);
    }
}
