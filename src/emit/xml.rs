//! XML rendering - directive stream to indented XML text (quick-xml)
//!
//! The stream is first folded into an element tree so malformed streams
//! (attributes with no open element, unbalanced `up`, several roots) are
//! reported before anything is written.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{Result, WeftError};

use super::directives::{Directive, Directives};

const INDENT: usize = 2;

#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Child>,
}

#[derive(Debug)]
enum Child {
    Element(Element),
    Text(String),
    Comment(String),
}

/// Render `directives` as a complete document.
///
/// `header` becomes a comment between the XML declaration and the root.
pub fn render_xml(directives: &Directives, header: Option<&str>) -> Result<String> {
    let root = build_tree(directives)?;

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    if let Some(header) = header {
        write_comment(&mut writer, header)?;
    }
    write_element(&mut writer, &root)?;

    let mut xml = String::from_utf8(writer.into_inner()).map_err(xml_error)?;
    xml.push('\n');
    Ok(xml)
}

fn build_tree(directives: &Directives) -> Result<Element> {
    let malformed = |reason: &str| WeftError::MalformedDirectives {
        reason: reason.to_string(),
    };

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    for op in directives {
        match op {
            Directive::Add(name) => {
                if root.is_some() && stack.is_empty() {
                    return Err(malformed("more than one root element"));
                }
                stack.push(Element {
                    name: name.clone(),
                    ..Default::default()
                });
            }
            Directive::Attr(key, value) => {
                let current = stack
                    .last_mut()
                    .ok_or_else(|| malformed("attribute outside any element"))?;
                match current.attrs.iter_mut().find(|attr| attr.0 == *key) {
                    Some(existing) => existing.1 = value.clone(),
                    None => current.attrs.push((key.clone(), value.clone())),
                }
            }
            Directive::Set(text) => stack
                .last_mut()
                .ok_or_else(|| malformed("text outside any element"))?
                .children
                .push(Child::Text(text.clone())),
            Directive::Comment(text) => stack
                .last_mut()
                .ok_or_else(|| malformed("comment outside any element"))?
                .children
                .push(Child::Comment(text.clone())),
            Directive::Up => {
                let done = stack.pop().ok_or_else(|| malformed("up with no open element"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Child::Element(done)),
                    None => root = Some(done),
                }
            }
        }
    }

    // Unclosed elements close implicitly
    while let Some(done) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(Child::Element(done)),
            None => root = Some(done),
        }
    }

    root.ok_or_else(|| malformed("empty document"))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(xml_error);
    }

    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    for child in &element.children {
        match child {
            Child::Element(inner) => write_element(writer, inner)?,
            Child::Text(text) => writer
                .write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))
                .map_err(xml_error)?,
            Child::Comment(text) => write_comment(writer, text)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_error)
}

fn write_comment(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<()> {
    // "--" may not appear inside a comment
    let body = format!(" {} ", text.replace("--", "- -"));
    writer
        .write_event(Event::Comment(BytesText::from_escaped(body)))
        .map_err(xml_error)
}

fn xml_error(err: impl std::fmt::Display) -> WeftError {
    WeftError::XmlWrite {
        details: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_indented_document() {
        let mut d = Directives::new();
        d.add("workflow-app").attr("name", "w");
        d.add("start").attr("to", "end").up();
        d.add("kill").attr("name", "kill").text_element("message", "a < b").up();
        d.add("end").attr("name", "end").up();
        d.up();

        let xml = render_xml(&d, Some("w workflow")).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<!-- w workflow -->"));
        assert!(xml.contains("\n  <start to=\"end\"/>"));
        assert!(xml.contains("<message>a &lt; b</message>"));
        assert!(xml.trim_end().ends_with("</workflow-app>"));
    }

    #[test]
    fn quotes_in_text_are_kept() {
        let mut d = Directives::new();
        d.add("case").set("${wf:conf('x') eq \"y\"}").up();
        let xml = render_xml(&d, None).unwrap();
        assert!(xml.contains("<case>${wf:conf('x') eq \"y\"}</case>"));
    }

    #[test]
    fn malformed_streams_are_rejected() {
        let mut attr_first = Directives::new();
        attr_first.attr("a", "b");
        assert!(render_xml(&attr_first, None).is_err());

        let mut extra_up = Directives::new();
        extra_up.add("a").up().up();
        assert!(render_xml(&extra_up, None).is_err());

        let mut two_roots = Directives::new();
        two_roots.add("a").up().add("b").up();
        assert!(render_xml(&two_roots, None).is_err());

        assert!(render_xml(&Directives::new(), None).is_err());
    }

    #[test]
    fn repeated_attribute_overwrites() {
        let mut d = Directives::new();
        d.add("a").attr("k", "1").attr("k", "2").up();
        let xml = render_xml(&d, None).unwrap();
        assert!(xml.contains("<a k=\"2\"/>"));
    }
}
