//! Binding Module - argument interpolation
//!
//! Materializes each step's arguments before code generation:
//! - `interpolate`: `$$key$$` substitution from named args, then defaults,
//!   plus whole-string expansion of list-valued sources
//! - `file`: `@@relative/path@@` replaced by the file's contents
//!
//! Data flow:
//! ```text
//! action type defaultArgs ──┐
//! step namedArgs ───────────┼─→ interpolate_args ─→ interpolate_files ─→ element values
//! type defaultInterpolations┤
//! step positionalArgs ──────┘ (list source)
//! ```
//!
//! Every function returns fresh values; inputs are never modified, so one
//! action type's default templates can be reused by any number of steps.

mod file;
mod interpolate;

// Re-export public types
pub use file::{interpolate_files, FILE_PREFIX, FILE_SUFFIX};
pub use interpolate::{interpolate, interpolate_args, Interpolated, PREFIX, SUFFIX};
