// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compound simple selectors.
//!
//! The collector only needs to recognize interactive elements and landmark
//! regions, which are described well by one compound selector each:
//! `a[href]`, `div[role=button]`, `ul.menu`, `#search`, `[contenteditable]`.
//! Combinators and pseudo-classes are not supported.

use core::fmt;

use crate::document::Document;
use crate::error::SelectorError;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    Class(String),
    Id(String),
    Has(String),
    Equals(String, String),
}

/// A parsed compound selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    /// `None` matches any tag.
    tag: Option<String>,
    parts: Vec<Part>,
}

impl Selector {
    /// Parse a compound selector.
    ///
    /// ```
    /// use dwell_engine::selector::Selector;
    ///
    /// assert!(Selector::parse("div[role=button].primary").is_ok());
    /// assert!(Selector::parse("nav > a").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        let src = text.trim();
        if src.is_empty() {
            return Err(SelectorError::Empty);
        }
        let bytes = src.as_bytes();
        let mut pos = 0;

        let tag = if bytes[0] == b'*' {
            pos = 1;
            None
        } else {
            let name = ident(src, &mut pos);
            (!name.is_empty()).then(|| name.to_ascii_lowercase())
        };

        let mut parts = Vec::new();
        while pos < bytes.len() {
            let start = pos;
            match bytes[pos] {
                b'.' | b'#' => {
                    pos += 1;
                    let name = ident(src, &mut pos);
                    if name.is_empty() {
                        return Err(missing(src, pos));
                    }
                    parts.push(if bytes[start] == b'.' {
                        Part::Class(name.to_owned())
                    } else {
                        Part::Id(name.to_owned())
                    });
                }
                b'[' => {
                    pos += 1;
                    parts.push(attribute(src, &mut pos)?);
                }
                _ => return Err(unexpected(src, pos)),
            }
        }
        Ok(Self { tag, parts })
    }

    /// Whether `node` matches.
    pub fn matches<D: Document>(&self, doc: &D, node: D::Node) -> bool {
        if let Some(tag) = &self.tag
            && !doc.tag_name(node).eq_ignore_ascii_case(tag)
        {
            return false;
        }
        self.parts.iter().all(|part| match part {
            Part::Class(c) => doc.has_class(node, c),
            Part::Id(id) => doc.attribute(node, "id") == Some(id.as_str()),
            Part::Has(name) => doc.attribute(node, name).is_some(),
            Part::Equals(name, value) => doc.attribute(node, name) == Some(value.as_str()),
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => f.write_str(tag)?,
            None if self.parts.is_empty() => f.write_str("*")?,
            None => {}
        }
        for part in &self.parts {
            match part {
                Part::Class(c) => write!(f, ".{c}")?,
                Part::Id(id) => write!(f, "#{id}")?,
                Part::Has(name) => write!(f, "[{name}]")?,
                Part::Equals(name, value) => write!(f, "[{name}=\"{value}\"]")?,
            }
        }
        Ok(())
    }
}

/// An ordered set of selectors; a node matches if any selector does.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorList(Vec<Selector>);

impl SelectorList {
    /// Parse every entry; the first failure is returned.
    ///
    /// Entries may themselves be comma-separated lists.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, SelectorError> {
        let mut out = Vec::new();
        for entry in entries {
            for piece in entry.as_ref().split(',') {
                out.push(Selector::parse(piece)?);
            }
        }
        Ok(Self(out))
    }

    /// Whether any selector matches `node`.
    pub fn matches<D: Document>(&self, doc: &D, node: D::Node) -> bool {
        self.0.iter().any(|s| s.matches(doc, node))
    }

    /// Number of selectors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty. An empty list matches nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn ident<'a>(src: &'a str, pos: &mut usize) -> &'a str {
    let start = *pos;
    let bytes = src.as_bytes();
    while *pos < bytes.len() && is_ident_byte(bytes[*pos]) {
        *pos += 1;
    }
    &src[start..*pos]
}

/// Parse the inside of `[...]`, with `pos` just after the `[`.
fn attribute(src: &str, pos: &mut usize) -> Result<Part, SelectorError> {
    let bytes = src.as_bytes();
    let name = ident(src, pos);
    if name.is_empty() {
        return Err(if *pos >= bytes.len() {
            SelectorError::Unterminated(src.to_owned())
        } else {
            missing(src, *pos)
        });
    }
    let name = name.to_ascii_lowercase();
    match bytes.get(*pos) {
        Some(b']') => {
            *pos += 1;
            Ok(Part::Has(name))
        }
        Some(b'=') => {
            *pos += 1;
            let value = match bytes.get(*pos) {
                Some(&q) if q == b'"' || q == b'\'' => {
                    *pos += 1;
                    let start = *pos;
                    while *pos < bytes.len() && bytes[*pos] != q {
                        *pos += 1;
                    }
                    if *pos >= bytes.len() {
                        return Err(SelectorError::Unterminated(src.to_owned()));
                    }
                    let value = &src[start..*pos];
                    *pos += 1;
                    value
                }
                _ => ident(src, pos),
            };
            match bytes.get(*pos) {
                Some(b']') => {
                    *pos += 1;
                    Ok(Part::Equals(name, value.to_owned()))
                }
                Some(_) => Err(unexpected(src, *pos)),
                None => Err(SelectorError::Unterminated(src.to_owned())),
            }
        }
        Some(_) => Err(unexpected(src, *pos)),
        None => Err(SelectorError::Unterminated(src.to_owned())),
    }
}

fn unexpected(src: &str, offset: usize) -> SelectorError {
    SelectorError::Unexpected {
        selector: src.to_owned(),
        offset,
        ch: src[offset..].chars().next().unwrap_or('\0'),
    }
}

fn missing(src: &str, offset: usize) -> SelectorError {
    SelectorError::MissingName {
        selector: src.to_owned(),
        offset,
    }
}
