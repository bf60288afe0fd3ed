//! Tag outline of an HTML document
//!
//! A lightweight tokenizer that records every start and end tag with its
//! byte offset. Comments, the doctype and the contents of `<script>` and
//! `<style>` are skipped. The outline is enough to check that a document is
//! structurally sound before and after it is edited; it is not a full HTML
//! parser.

use serde::{Deserialize, Serialize};

/// Elements that never have an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is raw text
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Kind of a tag in the outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagKind {
    /// `<name ...>`
    Start,
    /// `</name>`
    End,
    /// `<name .../>` or a void element
    Empty,
}

/// One tag of the outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Lowercased element name
    pub name: String,
    /// Start, end or empty tag
    pub kind: TagKind,
    /// Byte offset of `<`
    pub start: usize,
    /// Byte offset just past `>`
    pub end: usize,
    /// Attributes in document order, names lowercased
    pub attributes: Vec<(String, String)>,
}

impl Tag {
    /// Value of an attribute
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Outline validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlineValidation {
    /// Structural errors
    pub errors: Vec<String>,
}

impl OutlineValidation {
    /// Check if validation passed
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Ordered tags of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    tags: Vec<Tag>,
}

impl Outline {
    /// Tokenize a document.
    ///
    /// Never fails: unterminated constructs end the outline and are caught
    /// by [`Outline::validate`] through unbalanced elements.
    #[must_use]
    pub fn parse(document: &str) -> Self {
        let bytes = document.as_bytes();
        let mut tags = Vec::new();
        let mut pos = 0;
        let mut unterminated = false;

        while let Some(rel) = document[pos..].find('<') {
            let start = pos + rel;
            let rest = &document[start..];

            if rest.starts_with("<!--") {
                match rest.find("-->") {
                    Some(end) => pos = start + end + 3,
                    None => break,
                }
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                match rest.find('>') {
                    Some(end) => pos = start + end + 1,
                    None => break,
                }
                continue;
            }

            let is_end = rest.starts_with("</");
            let name_start = start + if is_end { 2 } else { 1 };
            if !bytes.get(name_start).is_some_and(u8::is_ascii_alphabetic) {
                pos = start + 1;
                continue;
            }

            let Some(tag_end) = find_tag_end(document, name_start) else {
                unterminated = true;
                break;
            };
            let inner = &document[name_start..tag_end];
            let name_len = inner
                .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
                .unwrap_or(inner.len());
            let name = inner[..name_len].to_ascii_lowercase();
            let self_closing = inner.trim_end().ends_with('/');
            let end = tag_end + 1;

            let kind = if is_end {
                TagKind::End
            } else if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
                TagKind::Empty
            } else {
                TagKind::Start
            };
            let attributes = if is_end {
                Vec::new()
            } else {
                parse_attributes(&inner[name_len..])
            };
            let raw_text = kind == TagKind::Start && RAW_TEXT_ELEMENTS.contains(&name.as_str());
            tags.push(Tag {
                name: name.clone(),
                kind,
                start,
                end,
                attributes,
            });
            pos = end;

            if raw_text {
                let closing = format!("</{name}");
                match find_ignore_ascii_case(&document[pos..], &closing) {
                    Some(rel_close) => pos += rel_close,
                    None => {
                        unterminated = true;
                        break;
                    }
                }
            }
        }

        if unterminated {
            tracing::debug!(offset = pos, "document ends inside a tag or raw text element");
        }
        Self { tags }
    }

    /// All tags in document order
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Tags of an element name and kind
    pub fn find<'a>(&'a self, name: &'a str, kind: TagKind) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags
            .iter()
            .filter(move |t| t.kind == kind && t.name == name)
    }

    /// First start tag of `name` carrying the given `id`
    #[must_use]
    pub fn element_with_id(&self, name: &str, id: &str) -> Option<&Tag> {
        self.tags
            .iter()
            .find(|t| t.kind != TagKind::End && t.name == name && t.attribute("id") == Some(id))
    }

    /// Check structure: balanced non-void elements and exactly one `<body>`
    #[must_use]
    pub fn validate(&self) -> OutlineValidation {
        let mut result = OutlineValidation::default();
        let mut stack: Vec<&Tag> = Vec::new();

        for tag in &self.tags {
            match tag.kind {
                TagKind::Start => stack.push(tag),
                TagKind::Empty => {}
                TagKind::End => {
                    if VOID_ELEMENTS.contains(&tag.name.as_str()) {
                        result
                            .errors
                            .push(format!("end tag for void element </{}>", tag.name));
                        continue;
                    }
                    match stack.pop() {
                        Some(open) if open.name == tag.name => {}
                        Some(open) => {
                            result.errors.push(format!(
                                "</{}> at byte {} closes <{}> opened at byte {}",
                                tag.name, tag.start, open.name, open.start
                            ));
                            return result;
                        }
                        None => {
                            result.errors.push(format!(
                                "</{}> at byte {} has no matching start tag",
                                tag.name, tag.start
                            ));
                            return result;
                        }
                    }
                }
            }
        }
        for open in stack {
            result
                .errors
                .push(format!("<{}> at byte {} is never closed", open.name, open.start));
        }

        let bodies = self.find("body", TagKind::Start).count();
        if bodies != 1 {
            result
                .errors
                .push(format!("expected exactly one <body>, found {bodies}"));
        }
        result
    }
}

fn find_tag_end(document: &str, from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (offset, &b) in document.as_bytes()[from..].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(from + offset),
            None => {}
        }
    }
    None
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    let mut rest = raw.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');

    while !rest.is_empty() {
        let name_len = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let name = rest[..name_len].to_ascii_lowercase();
        rest = rest[name_len..].trim_start();

        let mut value = String::new();
        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let quote = after_eq.chars().next().filter(|c| *c == '"' || *c == '\'');
            if let Some(q) = quote {
                let body = &after_eq[1..];
                let close = body.find(q).unwrap_or(body.len());
                value = body[..close].to_string();
                rest = body.get(close + 1..).unwrap_or("");
            } else {
                let len = after_eq
                    .find(|c: char| c.is_ascii_whitespace())
                    .unwrap_or(after_eq.len());
                value = after_eq[..len].to_string();
                rest = &after_eq[len..];
            }
        }
        if !name.is_empty() {
            attributes.push((name, value));
        }
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
    }
    attributes
}
