//! File Interpolation - `@@relative/path@@` replaced by file contents
//!
//! Only a value that is entirely one token is replaced. Paths resolve
//! against the directory of the workflow file.

use std::fs;
use std::path::Path;

use crate::ast::ArgMap;
use crate::error::{Result, WeftError};

pub const FILE_PREFIX: &str = "@@";
pub const FILE_SUFFIX: &str = "@@";

/// Replace every whole-string `@@path@@` value with the referenced file's text
pub fn interpolate_files(base_dir: &Path, input: &ArgMap) -> Result<ArgMap> {
    let mut out = ArgMap::with_capacity(input.len());

    for (arg, values) in input {
        let mut result = Vec::with_capacity(values.len());
        for value in values {
            match file_token(value) {
                Some(relative) => result.push(read_lines(base_dir, relative)?),
                None => result.push(value.clone()),
            }
        }
        out.insert(arg.clone(), result);
    }

    Ok(out)
}

fn file_token(value: &str) -> Option<&str> {
    value
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)
        .filter(|path| !path.is_empty())
}

/// File contents with line endings normalized and no trailing newline
fn read_lines(base_dir: &Path, relative: &str) -> Result<String> {
    let path = base_dir.join(relative);
    let content = fs::read_to_string(&path)
        .map_err(|source| WeftError::FileInterpolation { path, source })?;
    Ok(content.lines().collect::<Vec<_>>().join("\n"))
}
