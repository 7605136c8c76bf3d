//! Error types with error codes and fix suggestions
//!
//! Error code ranges:
//! - WEFT-000-009: Configuration errors (fatal for the whole run)
//! - WEFT-010-019: Workflow parse errors
//! - WEFT-020-029: Graph errors
//! - WEFT-030-039: Interpolation errors
//! - WEFT-040-049: Output errors
//! - WEFT-090-099: IO errors
//!
//! Only configuration errors abort a batch. Everything else is scoped to the
//! workflow file being compiled.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WeftError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Coarse error classification used by the batch driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Parse,
    WorkflowGraph,
    Interpolation,
    Io,
}

#[derive(Error, Debug)]
pub enum WeftError {
    // ═══════════════════════════════════════════
    // CONFIGURATION ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[WEFT-001] Failed to parse config '{path}': {details}")]
    ConfigParse { path: PathBuf, details: String },

    #[error("[WEFT-002] {field} do not match for {kind} '{name}'")]
    ConfigConflict {
        kind: &'static str,
        name: String,
        field: &'static str,
    },

    #[error("[WEFT-003] Config path not found: {path}")]
    ConfigNotFound { path: PathBuf },

    // ═══════════════════════════════════════════
    // WORKFLOW PARSE ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[WEFT-010] Failed to parse workflow '{path}': {details}")]
    WorkflowParse { path: PathBuf, details: String },

    #[error("[WEFT-011] Input path not found: {path}")]
    InputNotFound { path: PathBuf },

    // ═══════════════════════════════════════════
    // GRAPH ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[WEFT-020] Cycle detected: {cycle}")]
    CycleDetected { cycle: String },

    #[error("[WEFT-021] Missing dependency: '{node}' depends on unknown '{dependency}'")]
    MissingDependency { node: String, dependency: String },

    #[error("[WEFT-022] Duplicate node name '{name}'")]
    DuplicateNode { name: String },

    #[error("[WEFT-023] Step '{step}' uses unknown action type '{action_type}'")]
    UnknownActionType { step: String, action_type: String },

    #[error("[WEFT-024] Invalid node name '{name}'")]
    InvalidNodeName { name: String },

    #[error("[WEFT-025] Graph invariant violated: {reason}")]
    InvariantViolation { reason: String },

    // ═══════════════════════════════════════════
    // INTERPOLATION ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[WEFT-030] Unresolved variable '$${key}$$' in '{input}'")]
    UnresolvedVariable { key: String, input: String },

    #[error("[WEFT-031] Cannot read interpolated file '{path}': {source}")]
    FileInterpolation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ═══════════════════════════════════════════
    // OUTPUT ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[WEFT-040] Malformed directive stream: {reason}")]
    MalformedDirectives { reason: String },

    #[error("[WEFT-041] Failed to render XML: {details}")]
    XmlWrite { details: String },

    #[error("[WEFT-042] Output '{output}' of '{second}' was already written for '{first}'")]
    OutputCollision {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    // ═══════════════════════════════════════════
    // IO ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[WEFT-090] IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WeftError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WeftError::ConfigParse { .. }
            | WeftError::ConfigConflict { .. }
            | WeftError::ConfigNotFound { .. } => ErrorCategory::Configuration,
            WeftError::WorkflowParse { .. } | WeftError::InputNotFound { .. } => {
                ErrorCategory::Parse
            }
            WeftError::CycleDetected { .. }
            | WeftError::MissingDependency { .. }
            | WeftError::DuplicateNode { .. }
            | WeftError::UnknownActionType { .. }
            | WeftError::InvalidNodeName { .. }
            | WeftError::InvariantViolation { .. } => ErrorCategory::WorkflowGraph,
            WeftError::UnresolvedVariable { .. } | WeftError::FileInterpolation { .. } => {
                ErrorCategory::Interpolation
            }
            WeftError::MalformedDirectives { .. }
            | WeftError::XmlWrite { .. }
            | WeftError::OutputCollision { .. }
            | WeftError::Io(_) => ErrorCategory::Io,
        }
    }

    /// Configuration is shared by every workflow in a run, so its errors end the run.
    pub fn is_run_fatal(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }
}

impl FixSuggestion for WeftError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            WeftError::ConfigParse { .. } => Some("Check YAML syntax: indentation and quoting"),
            WeftError::ConfigConflict { .. } => {
                Some("Definitions sharing a name must agree on tag/xmlns (action types) or type (credentials)")
            }
            WeftError::ConfigNotFound { .. } => Some("Check the -c/-l paths exist"),
            WeftError::WorkflowParse { .. } => Some("Check YAML syntax: indentation and quoting"),
            WeftError::InputNotFound { .. } => Some("Check the -i path exists"),
            WeftError::CycleDetected { .. } => {
                Some("Remove the circular dependency - a step cannot (transitively) depend on itself")
            }
            WeftError::MissingDependency { .. } => {
                Some("Declare the dependency as an action or decision, or fix the typo")
            }
            WeftError::DuplicateNode { .. } => {
                Some("Rename the node; 'start', 'end', 'fork-N', 'join-N', the kill name and the ?-/ki-/kN- names of onlyIf and killIf steps are reserved")
            }
            WeftError::UnknownActionType { .. } => {
                Some("Add the action type to a config file passed with -c or -l")
            }
            WeftError::InvalidNodeName { .. } => {
                Some("Names must be non-empty without whitespace, quotes, '<', '>' or '&'")
            }
            WeftError::InvariantViolation { .. } => None,
            WeftError::UnresolvedVariable { .. } => {
                Some("Add the key to namedArgs or to the action type's defaultInterpolations")
            }
            WeftError::FileInterpolation { .. } => {
                Some("@@path@@ is resolved relative to the workflow file's directory")
            }
            WeftError::MalformedDirectives { .. } => None,
            WeftError::XmlWrite { .. } => None,
            WeftError::OutputCollision { .. } => {
                Some("Inputs written to one directory need distinct file stems")
            }
            WeftError::Io(_) => Some("Check file path and permissions"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_run_fatal() {
        let err = WeftError::ConfigConflict {
            kind: "ActionType",
            name: "java".to_string(),
            field: "Tags",
        };
        assert!(err.is_run_fatal());
        assert_eq!(
            err.to_string(),
            "[WEFT-002] Tags do not match for ActionType 'java'"
        );
    }

    #[test]
    fn graph_errors_are_scoped_to_one_file() {
        let err = WeftError::MissingDependency {
            node: "b".to_string(),
            dependency: "x".to_string(),
        };
        assert!(!err.is_run_fatal());
        assert_eq!(err.category(), ErrorCategory::WorkflowGraph);
        assert!(err.fix_suggestion().is_some());
    }

    #[test]
    fn unresolved_variable_message_shows_token() {
        let err = WeftError::UnresolvedVariable {
            key: "date".to_string(),
            input: "out/$$date$$".to_string(),
        };
        assert!(err.to_string().contains("'$$date$$'"));
        assert_eq!(err.category(), ErrorCategory::Interpolation);
    }
}
