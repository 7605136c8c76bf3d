//! Directive stream - a flat, append-only description of an XML tree
//!
//! `add` opens a child of the current element and moves into it, `up` moves
//! back to the parent. Attributes and text always target the current element.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Open a child element and make it current
    Add(String),
    /// Set an attribute on the current element
    Attr(String, String),
    /// Append text to the current element
    Set(String),
    /// Append a comment to the current element
    Comment(String),
    /// Return to the parent element
    Up,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Add(name) => write!(f, "ADD {name:?}"),
            Directive::Attr(key, value) => write!(f, "ATTR {key:?} {value:?}"),
            Directive::Set(text) => write!(f, "SET {text:?}"),
            Directive::Comment(text) => write!(f, "COMMENT {text:?}"),
            Directive::Up => f.write_str("UP"),
        }
    }
}

/// Chainable builder over a `Vec<Directive>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    ops: Vec<Directive>,
}

impl Directives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>) -> &mut Self {
        self.ops.push(Directive::Add(name.into()));
        self
    }

    pub fn attr(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.ops.push(Directive::Attr(key.into(), value.into()));
        self
    }

    /// Set an attribute to the first present value, or skip it
    pub fn attr_first<I, V>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = Option<V>>,
        V: ToString,
    {
        if let Some(value) = values.into_iter().flatten().next() {
            self.attr(key, value.to_string());
        }
        self
    }

    pub fn set(&mut self, text: impl Into<String>) -> &mut Self {
        self.ops.push(Directive::Set(text.into()));
        self
    }

    pub fn comment(&mut self, text: impl Into<String>) -> &mut Self {
        self.ops.push(Directive::Comment(text.into()));
        self
    }

    pub fn up(&mut self) -> &mut Self {
        self.ops.push(Directive::Up);
        self
    }

    /// `<name>text</name>` as a child of the current element
    pub fn text_element(&mut self, name: &str, text: impl Into<String>) -> &mut Self {
        self.add(name).set(text).up()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Directive> {
        self.ops.iter()
    }
}

impl<'a> IntoIterator for &'a Directives {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl fmt::Display for Directives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            writeln!(f, "{op}")?;
        }
        Ok(())
    }
}
