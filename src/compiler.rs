//! Compiler - per-workflow pipeline and batch driver
//!
//! ```text
//! Workflow ─→ input graph ─→ structured graph ─→ directives ─→ XML
//! ```
//!
//! Failures are scoped to one file: the batch records them and moves on,
//! unless `strict` is set.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{error, info};

use crate::ast::{Config, Workflow};
use crate::config::load_workflow;
use crate::dag::{build_input_graph, build_workflow_graph, Dag, NodeKind};
use crate::emit::{build_document, render_xml, to_dot, Directives};
use crate::error::{Result, WeftError};

const DOT_DIR: &str = "dot";

/// XML output path -> input that wrote it, for one batch
type Claims = FxHashMap<PathBuf, PathBuf>;

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Write XML here instead of next to each input
    pub output_dir: Option<PathBuf>,
    /// Also write DOT files for both graphs
    pub graphviz: bool,
    /// Stop at the first failing workflow
    pub strict: bool,
    /// Dry run when false
    pub write: bool,
}

/// Everything produced for one workflow
#[derive(Debug, Clone)]
pub struct CompiledWorkflow {
    pub name: String,
    pub input_graph: Dag,
    pub graph: Dag,
    pub directives: Directives,
}

impl CompiledWorkflow {
    pub fn fork_count(&self) -> usize {
        self.graph.nodes_of_kind(NodeKind::Fork).count()
    }

    /// Render with the generated-file header
    pub fn to_xml(&self, generated_on: &str) -> Result<String> {
        let header = format!("{} workflow autogenerated by weft on {}", self.name, generated_on);
        render_xml(&self.directives, Some(&header))
    }
}

/// Outcome of one successfully compiled file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub workflow: String,
    pub nodes: usize,
    pub forks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: WeftError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub compiled: Vec<FileReport>,
    pub failed: Vec<FileFailure>,
    /// Files left unprocessed after a strict-mode or run-fatal failure
    pub skipped: usize,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Compiler {
    config: Config,
    options: CompileOptions,
    generated_on: String,
}

impl Compiler {
    pub fn new(config: Config, options: CompileOptions) -> Self {
        Self {
            config,
            options,
            generated_on: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile one parsed workflow. `source_dir` anchors `@@file@@` references.
    pub fn compile(&self, workflow: &Workflow, source_dir: &Path) -> Result<CompiledWorkflow> {
        self.check_action_types(workflow)?;

        let kill_name = self.config.kill().map(|(name, _)| name);
        let input_graph = build_input_graph(workflow, kill_name)?;
        let graph = build_workflow_graph(&input_graph, workflow, &self.config)?;
        let directives = build_document(workflow, &self.config, &graph, source_dir)?;

        Ok(CompiledWorkflow {
            name: workflow.name.clone(),
            input_graph,
            graph,
            directives,
        })
    }

    /// Parse, compile and (unless dry-running) write one workflow file
    pub fn compile_file(&self, path: &Path) -> Result<FileReport> {
        self.compile_file_claiming(path, &mut Claims::default())
    }

    fn compile_file_claiming(&self, path: &Path, claims: &mut Claims) -> Result<FileReport> {
        let workflow = load_workflow(path)?;
        let source_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let compiled = self.compile(&workflow, source_dir)?;
        let xml = compiled.to_xml(&self.generated_on)?;

        let output = if self.options.write {
            Some(self.write_outputs(path, &compiled, &xml, claims)?)
        } else {
            None
        };

        Ok(FileReport {
            path: path.to_path_buf(),
            workflow: compiled.name.clone(),
            nodes: compiled.graph.len(),
            forks: compiled.fork_count(),
            output,
        })
    }

    pub fn compile_all(&self, files: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut claims = Claims::default();

        for (i, path) in files.iter().enumerate() {
            match self.compile_file_claiming(path, &mut claims) {
                Ok(file) => {
                    info!(workflow = %file.workflow, path = %path.display(), nodes = file.nodes, "compiled");
                    report.compiled.push(file);
                }
                Err(err) => {
                    error!(path = %path.display(), error = %err, "workflow failed");
                    let stop = self.options.strict || err.is_run_fatal();
                    report.failed.push(FileFailure {
                        path: path.clone(),
                        error: err,
                    });
                    if stop {
                        report.skipped = files.len() - i - 1;
                        break;
                    }
                }
            }
        }

        report
    }

    fn check_action_types(&self, workflow: &Workflow) -> Result<()> {
        for step in workflow.actions.iter().chain(&workflow.error_handler) {
            if self.config.action_type(&step.action_type).is_none() {
                return Err(WeftError::UnknownActionType {
                    step: step.name.clone(),
                    action_type: step.action_type.clone(),
                });
            }
        }
        Ok(())
    }

    /// Inputs sharing a stem and an output directory would overwrite each
    /// other; the later one fails instead.
    fn write_outputs(
        &self,
        path: &Path,
        compiled: &CompiledWorkflow,
        xml: &str,
        claims: &mut Claims,
    ) -> Result<PathBuf> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| compiled.name.clone());
        let dir = match &self.options.output_dir {
            Some(dir) => dir.clone(),
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        let xml_path = dir.join(format!("{stem}.xml"));
        if let Some(first) = claims.get(&xml_path).filter(|first| first.as_path() != path) {
            return Err(WeftError::OutputCollision {
                output: xml_path,
                first: first.clone(),
                second: path.to_path_buf(),
            });
        }
        claims.insert(xml_path.clone(), path.to_path_buf());

        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(&dir)?;
        }
        fs::write(&xml_path, xml)?;

        if self.options.graphviz {
            let dot_dir = dir.join(DOT_DIR);
            fs::create_dir_all(&dot_dir)?;
            fs::write(
                dot_dir.join(format!("{stem}.dot")),
                to_dot(&compiled.graph, &compiled.name),
            )?;
            fs::write(
                dot_dir.join(format!("{stem}-input.dot")),
                to_dot(&compiled.input_graph, &compiled.name),
            )?;
        }

        Ok(xml_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ActionType, Step};
    use tempfile::TempDir;

    fn config() -> Config {
        Config {
            action_types: vec![ActionType {
                name: "shell".into(),
                tag: "shell".into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn unknown_type_fails_before_synthesis() {
        let compiler = Compiler::new(config(), CompileOptions::default());
        let wf = Workflow {
            name: "w".into(),
            error_handler: Some(Step {
                name: "alert".into(),
                action_type: "email".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            compiler.compile(&wf, Path::new(".")),
            Err(WeftError::UnknownActionType { ref action_type, .. }) if action_type == "email"
        ));
    }

    #[test]
    fn batch_continues_past_failures() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.yaml");
        let good = dir.path().join("good.yaml");
        fs::write(&bad, "name: bad\nactions:\n  - {name: a, type: shell, dependencies: [x]}\n").unwrap();
        fs::write(&good, "name: good\nactions:\n  - {name: a, type: shell}\n").unwrap();

        let options = CompileOptions {
            write: true,
            ..Default::default()
        };
        let report = Compiler::new(config(), options).compile_all(&[bad.clone(), good.clone()]);
        assert!(!report.is_success());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.compiled.len(), 1);
        assert!(dir.path().join("good.xml").exists());
        assert!(!dir.path().join("bad.xml").exists());
    }

    #[test]
    fn strict_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.yaml");
        let good = dir.path().join("good.yaml");
        fs::write(&bad, "name: [unterminated").unwrap();
        fs::write(&good, "name: good\n").unwrap();

        let options = CompileOptions {
            strict: true,
            ..Default::default()
        };
        let report = Compiler::new(config(), options).compile_all(&[bad, good]);
        assert_eq!(report.failed.len(), 1);
        assert!(report.compiled.is_empty());
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn same_stem_into_one_output_dir_fails_the_second_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        for sub in ["team-a", "team-b"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
        }
        let first = dir.path().join("team-a/nightly.yaml");
        let second = dir.path().join("team-b/nightly.yaml");
        fs::write(&first, "name: first\nactions:\n  - {name: a, type: shell}\n").unwrap();
        fs::write(&second, "name: second\nactions:\n  - {name: a, type: shell}\n").unwrap();

        let options = CompileOptions {
            output_dir: Some(out.clone()),
            write: true,
            ..Default::default()
        };
        let report = Compiler::new(config(), options).compile_all(&[first.clone(), second.clone()]);

        assert_eq!(report.compiled.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.skipped, 0);
        let failure = &report.failed[0];
        assert_eq!(failure.path, second);
        assert!(matches!(
            &failure.error,
            WeftError::OutputCollision { first: f, .. } if f == &first
        ));

        let written = fs::read_to_string(out.join("nightly.xml")).unwrap();
        assert!(written.contains(r#"<workflow-app name="first">"#));
    }

    #[test]
    fn same_stem_in_separate_dirs_without_output_dir_is_fine() {
        let dir = TempDir::new().unwrap();
        for sub in ["team-a", "team-b"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
        }
        let first = dir.path().join("team-a/nightly.yaml");
        let second = dir.path().join("team-b/nightly.yaml");
        fs::write(&first, "name: first\n").unwrap();
        fs::write(&second, "name: second\n").unwrap();

        let options = CompileOptions {
            write: true,
            ..Default::default()
        };
        let report = Compiler::new(config(), options).compile_all(&[first, second]);
        assert!(report.is_success());
        assert!(dir.path().join("team-a/nightly.xml").exists());
        assert!(dir.path().join("team-b/nightly.xml").exists());
    }

    #[test]
    fn graphviz_files_land_in_dot_dir() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let wf = dir.path().join("nightly.yaml");
        fs::write(&wf, "name: nightly\nactions:\n  - {name: a, type: shell}\n  - {name: b, type: shell}\n").unwrap();

        let options = CompileOptions {
            output_dir: Some(out.clone()),
            graphviz: true,
            write: true,
            ..Default::default()
        };
        let report = Compiler::new(config(), options).compile_file(&wf).unwrap();
        assert_eq!(report.output.as_deref(), Some(out.join("nightly.xml").as_path()));
        assert_eq!(report.forks, 1);
        assert!(out.join("dot/nightly.dot").exists());
        assert!(out.join("dot/nightly-input.dot").exists());
    }
}
