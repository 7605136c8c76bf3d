//! Loading - YAML config and workflow files from disk
//!
//! A path may name a single file or a directory; directories are walked
//! recursively for `*.yaml`/`*.yml` in sorted order so runs are reproducible.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::ast::{Config, Workflow};
use crate::error::{Result, WeftError};

use super::merge::merge_configs;

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Expand a file or directory into the YAML files it contains
pub fn yaml_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| WeftError::Io(e.into()))?;
        if entry.file_type().is_file() && is_yaml(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

pub fn load_config_file(path: &Path, low_precedence: bool) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| WeftError::ConfigParse {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;

    let mut config: Config = if content.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&content).map_err(|e| WeftError::ConfigParse {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?
    };
    config.set_low_precedence(low_precedence);

    debug!(path = %path.display(), low_precedence, action_types = config.action_types.len(), "loaded config");
    Ok(config)
}

/// Load and merge every config under `high` (regular) and `low` (low precedence)
pub fn load_configs(high: &[PathBuf], low: &[PathBuf]) -> Result<Config> {
    let mut configs = Vec::new();

    for (paths, low_precedence) in [(high, false), (low, true)] {
        for root in paths {
            if !root.exists() {
                return Err(WeftError::ConfigNotFound { path: root.clone() });
            }
            for file in yaml_files(root)? {
                configs.push(load_config_file(&file, low_precedence)?);
            }
        }
    }

    merge_configs(configs)
}

pub fn load_workflow(path: &Path) -> Result<Workflow> {
    let content = fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|e| WeftError::WorkflowParse {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

/// All workflow files named by the inputs, in order, without repeats
pub fn workflow_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for input in inputs {
        if !input.exists() {
            return Err(WeftError::InputNotFound { path: input.clone() });
        }
        for file in yaml_files(input)? {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }
    Ok(files)
}
