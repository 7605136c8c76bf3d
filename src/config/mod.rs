//! Config Module - reading inputs from disk
//!
//! - `load`: file/directory discovery, YAML parsing with scoped errors
//! - `merge`: precedence-aware folding of many config files

mod load;
mod merge;

pub use load::{load_config_file, load_configs, load_workflow, workflow_files, yaml_files};
pub use merge::merge_configs;
