//! Emit Module - code generation
//!
//! - `directives`: flat add/attr/set/up stream describing the XML tree
//! - `elements`: builders for each workflow construct
//! - `document`: walks the structured graph and assembles the document
//! - `xml`: renders a directive stream with quick-xml
//! - `dot`: Graphviz text for either graph

mod directives;
mod document;
mod dot;
mod elements;
mod xml;

pub use directives::{Directive, Directives};
pub use document::build_document;
pub use dot::to_dot;
pub use elements::{step_entries, step_prepare};
pub use xml::render_xml;
