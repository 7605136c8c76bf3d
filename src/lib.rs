//! Weft - compiles dependency-based workflow YAML into Oozie workflow XML
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  ast/       YAML → Rust types (Workflow, Step, ActionType)   │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      COMPILER CORE                           │
//! │  dag/       Dag, input graph, fork/join synthesis, routing   │
//! │  binding/   $$key$$ / @@file@@ interpolation                 │
//! │  emit/      Directive stream, XML (quick-xml), DOT           │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         DRIVER                               │
//! │  config/    File discovery, config merging                   │
//! │  compiler   Per-file pipeline, batch failure scoping         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`ast`] | YAML parsing → `Workflow`, `Step`, `Decision`, `Config`, `ActionType` |
//! | [`binding`] | Argument interpolation from named, default, list and file sources |
//! | [`dag`] | Graph model with FxHashMap adjacency, synthesis, transition resolution |
//! | [`emit`] | Code generation to XML and Graphviz |
//! | [`config`] | Loading and precedence-aware merging of config files |
//! | [`compiler`] | Compile one workflow or a batch of files |
//! | [`error`] | Error types with fix suggestions |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL
// ═══════════════════════════════════════════════════════════════
pub mod ast;

// ═══════════════════════════════════════════════════════════════
// COMPILER CORE
// ═══════════════════════════════════════════════════════════════
pub mod binding;
pub mod dag;
pub mod emit;

// ═══════════════════════════════════════════════════════════════
// DRIVER
// ═══════════════════════════════════════════════════════════════
pub mod compiler;
pub mod config;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING
// ═══════════════════════════════════════════════════════════════
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

pub use error::{ErrorCategory, FixSuggestion, Result, WeftError};

pub use ast::{ActionType, Config, Decision, Step, Workflow};

pub use compiler::{BatchReport, CompileOptions, CompiledWorkflow, Compiler, FileReport};

pub use dag::{Dag, NodeKind, WorkflowNode};
