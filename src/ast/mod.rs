//! AST Module - Parsed types for YAML workflows and configuration
//!
//! Contains parsed Rust types from YAML definitions:
//! - `workflow`: Workflow, Step, Decision, ConditionalKill, Global, Credential
//! - `config`: Config, ActionType
//!
//! These types represent the "what" - static structure parsed from YAML.
//! For graph construction, see the `dag` module.

mod config;
mod workflow;

// Re-export all public types
pub use config::{ActionType, Config};
pub use workflow::{
    ArgMap, ConditionalKill, Credential, Decision, DecisionCase, Global, NamedArgs, PrepareOp,
    Step, Workflow,
};
