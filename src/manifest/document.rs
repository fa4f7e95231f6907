//! Format-preserving YAML tree
//!
//! Nodes are built from the `yaml-rust` event stream and remember where each
//! scalar starts in the source text and how it was quoted. Edits replace the
//! exact source span of one scalar, so encoding a document reproduces the
//! original text byte for byte apart from the scalars that were replaced.
//! Comments, key order, indentation, flow style and document separators are
//! never touched.
//!
//! An alias is resolved to a copy of the node its anchor names, with the
//! anchored node's positions. Replacing an image reached through an alias
//! therefore rewrites the anchored scalar.

use crate::{
    errors::ManifestError,
    manifest::node::{NodeKind, TreeNode},
};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use yaml_rust::{
    parser::{Event, MarkedEventReceiver, Parser},
    scanner::{Marker, TScalarStyle},
};

/// How a scalar was written in the source
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl From<TScalarStyle> for ScalarStyle {
    fn from(style: TScalarStyle) -> Self {
        match style {
            TScalarStyle::Any | TScalarStyle::Plain => ScalarStyle::Plain,
            TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
            TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
            TScalarStyle::Literal => ScalarStyle::Literal,
            _ => ScalarStyle::Folded,
        }
    }
}

/// Where a node starts in the source text
///
/// `offset` is in bytes; `line` and `column` count from one.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Mark {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// A scalar value, with enough position and style information to replace it
/// in the source
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Scalar {
    pub value: String,
    pub style: ScalarStyle,
    pub mark: Mark,
}

impl Scalar {
    /// Does this scalar hold text, rather than a null, boolean or number?
    pub fn is_string(&self) -> bool {
        lazy_static! {
            // YAML 1.2 core schema
            static ref NOT_STRING: Regex = Regex::new(concat!(
                "^(?:",
                "~|null|Null|NULL|true|True|TRUE|false|False|FALSE",
                "|[-+]?[0-9]+|0o[0-7]+|0x[0-9a-fA-F]+",
                "|[-+]?(?:\\.[0-9]+|[0-9]+(?:\\.[0-9]*)?)(?:[eE][-+]?[0-9]+)?",
                "|[-+]?\\.(?:inf|Inf|INF)|\\.(?:nan|NaN|NAN)",
                ")$"
            ))
            .unwrap();
        }
        self.style != ScalarStyle::Plain
            || !(self.value.is_empty() || NOT_STRING.is_match(&self.value))
    }
}

/// A node in a format-preserving document tree
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node {
    Mapping { entries: Vec<(Node, Node)>, mark: Mark },
    Sequence { items: Vec<Node>, mark: Mark },
    Scalar(Scalar),
    Alias { mark: Mark },
}

impl Node {
    pub fn mark(&self) -> Mark {
        match self {
            Node::Mapping { mark, .. } | Node::Sequence { mark, .. } | Node::Alias { mark } => {
                *mark
            }
            Node::Scalar(scalar) => scalar.mark,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    // Aliases copy their anchored node, so one offset can appear many times
    fn set_scalar_value(&mut self, offset: usize, value: &str) {
        match self {
            Node::Scalar(scalar) if scalar.mark.offset == offset => scalar.value = value.to_owned(),
            Node::Scalar(_) | Node::Alias { .. } => {}
            Node::Sequence { items, .. } => {
                for item in items {
                    item.set_scalar_value(offset, value);
                }
            }
            Node::Mapping { entries, .. } => {
                for (key, item) in entries {
                    key.set_scalar_value(offset, value);
                    item.set_scalar_value(offset, value);
                }
            }
        }
    }
}

impl TreeNode for Node {
    fn kind(&self) -> NodeKind {
        match self {
            Node::Mapping { .. } => NodeKind::Mapping,
            Node::Sequence { .. } => NodeKind::Sequence,
            Node::Scalar(_) => NodeKind::Scalar,
            Node::Alias { .. } => NodeKind::Alias,
        }
    }

    fn scalar_str(&self) -> Option<&str> {
        self.as_scalar()
            .filter(|scalar| scalar.is_string())
            .map(|scalar| scalar.value.as_str())
    }

    fn map_entries(&self) -> Vec<(&Self, &Self)> {
        match self {
            Node::Mapping { entries, .. } => entries.iter().map(|(k, v)| (k, v)).collect(),
            _ => Vec::new(),
        }
    }

    fn elements(&self) -> Vec<&Self> {
        match self {
            Node::Sequence { items, .. } => items.iter().collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
struct Edit {
    end: usize,
    text: String,
}

/// A stream of one or more YAML (or JSON) documents, with pending edits
#[derive(Clone, Debug)]
pub struct Document {
    source: String,
    roots: Vec<Node>,
    edits: BTreeMap<usize, Edit>,
}

impl Document {
    /// Parse every document in a stream
    ///
    /// Syntax errors report the number of the document they occurred in,
    /// counting from zero. A leading byte order mark is kept in the source
    /// but not parsed.
    pub fn parse(source: &str) -> Result<Document, ManifestError> {
        let bom = if source.starts_with(BOM) { BOM.len_utf8() } else { 0 };
        let mut builder = TreeBuilder::new(source, bom);
        let mut parser = Parser::new(source[bom..].chars());
        parser
            .load(&mut builder, true)
            .map_err(|err| ManifestError::Syntax {
                document: builder.documents.len(),
                source: err,
            })?;
        log::trace!("parsed {} documents", builder.documents.len());
        Ok(Document {
            source: source.to_owned(),
            roots: builder.documents,
            edits: BTreeMap::new(),
        })
    }

    /// Root node of each document in the stream
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// The original text, without any edits
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Has anything been replaced since parsing?
    pub fn is_modified(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Replace the text of one scalar, keeping its quoting style
    ///
    /// The scalar is identified by its position, so it should be one found in
    /// this document's tree. Block and folded scalars, and quoted scalars
    /// written with escapes or line breaks, can't be matched to a single source
    /// span and are rejected.
    pub fn replace_scalar(&mut self, scalar: &Scalar, value: &str) -> Result<(), ManifestError> {
        let offset = scalar.mark.offset;
        let end = match self.edits.get(&offset) {
            Some(edit) => edit.end,
            None => self
                .original_end(offset)
                .ok_or_else(|| ManifestError::UnsupportedScalar {
                    value: scalar.value.clone(),
                    style: scalar.style,
                    line: scalar.mark.line,
                    column: scalar.mark.column,
                })?,
        };
        let text = render(value, scalar.style);
        for root in &mut self.roots {
            root.set_scalar_value(offset, value);
        }
        self.edits.insert(offset, Edit { end, text });
        Ok(())
    }

    /// Produce the text of the document stream with all edits applied
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for (start, edit) in &self.edits {
            out.push_str(&self.source[cursor..*start]);
            out.push_str(&edit.text);
            cursor = edit.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }

    /// Find the end of the original scalar starting at `offset`, by checking
    /// that the source there is exactly the raw form of its parsed value
    fn original_end(&self, offset: usize) -> Option<usize> {
        let original = self
            .roots
            .iter()
            .flat_map(crate::manifest::node::walk)
            .filter_map(Node::as_scalar)
            .find(|scalar| scalar.mark.offset == offset)?;
        let raw = match original.style {
            ScalarStyle::Plain => original.value.clone(),
            ScalarStyle::SingleQuoted => single_quoted(&original.value),
            ScalarStyle::DoubleQuoted if !needs_escapes(&original.value) => {
                format!("\"{}\"", original.value)
            }
            _ => return None,
        };
        let rest = self.source.get(offset..)?;
        if rest.starts_with(&raw) {
            Some(offset + raw.len())
        } else {
            None
        }
    }
}

const BOM: char = '\u{feff}';

fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn needs_escapes(value: &str) -> bool {
    value.chars().any(|c| c == '"' || c == '\\' || c.is_control())
}

/// Can this text be written as a plain scalar, in block or flow context,
/// without changing its meaning?
fn plain_safe(value: &str) -> bool {
    const INDICATORS: &[char] = &[
        '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
        '`',
    ];
    match value.chars().next() {
        None => false,
        Some(first) if INDICATORS.contains(&first) || first.is_whitespace() => false,
        Some(_) => {
            !value.ends_with(|c: char| c.is_whitespace() || c == ':')
                && !value.contains(": ")
                && !value.contains(" #")
                && !value.contains(|c: char| "[]{},".contains(c) || c.is_control())
        }
    }
}

/// Source text for a replacement scalar in the style of the one it replaces
fn render(value: &str, style: ScalarStyle) -> String {
    match style {
        ScalarStyle::Plain if plain_safe(value) => value.to_owned(),
        ScalarStyle::SingleQuoted if !value.contains(|c: char| c.is_control()) => {
            single_quoted(value)
        }
        _ => format!(
            "\"{}\"",
            value
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n")
                .replace('\t', "\\t")
        ),
    }
}

enum Frame {
    Sequence {
        items: Vec<Node>,
        anchor: usize,
        mark: Mark,
    },
    Mapping {
        entries: Vec<(Node, Node)>,
        key: Option<Node>,
        anchor: usize,
        mark: Mark,
    },
}

/// Event receiver that assembles one [Node] tree per document
struct TreeBuilder<'a> {
    source: &'a str,
    // bytes skipped before the text handed to the parser
    start: usize,
    // byte offset of each parsed char, only needed when the source isn't ASCII
    char_offsets: Option<Vec<usize>>,
    documents: Vec<Node>,
    stack: Vec<Frame>,
    anchors: HashMap<usize, Node>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str, start: usize) -> Self {
        let parsed = &source[start..];
        let char_offsets = if parsed.is_ascii() {
            None
        } else {
            Some(parsed.char_indices().map(|(offset, _)| offset).collect())
        };
        TreeBuilder {
            source,
            start,
            char_offsets,
            documents: Vec::new(),
            stack: Vec::new(),
            anchors: HashMap::new(),
        }
    }

    fn mark(&self, marker: Marker) -> Mark {
        // Marker indices count chars, not bytes
        let offset = match &self.char_offsets {
            None => marker.index(),
            Some(offsets) => offsets
                .get(marker.index())
                .copied()
                .unwrap_or_else(|| self.source.len()),
        };
        Mark {
            offset: (self.start + offset).min(self.source.len()),
            line: marker.line(),
            column: marker.col() + 1,
        }
    }

    // Anchor ids start at one; zero means no anchor
    fn anchor(&mut self, anchor: usize, node: &Node) {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
    }

    fn insert(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => self.documents.push(node),
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping { entries, key, .. }) => match key.take() {
                None => *key = Some(node),
                Some(k) => entries.push((k, node)),
            },
        }
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, event: Event, marker: Marker) {
        let mark = self.mark(marker);
        match event {
            Event::SequenceStart(anchor) => self.stack.push(Frame::Sequence {
                items: Vec::new(),
                anchor,
                mark,
            }),
            Event::MappingStart(anchor) => self.stack.push(Frame::Mapping {
                entries: Vec::new(),
                key: None,
                anchor,
                mark,
            }),
            Event::SequenceEnd | Event::MappingEnd => {
                let (node, anchor) = match self.stack.pop() {
                    Some(Frame::Sequence { items, anchor, mark }) => {
                        (Node::Sequence { items, mark }, anchor)
                    }
                    Some(Frame::Mapping {
                        entries,
                        anchor,
                        mark,
                        ..
                    }) => (Node::Mapping { entries, mark }, anchor),
                    None => return,
                };
                self.anchor(anchor, &node);
                self.insert(node);
            }
            Event::Scalar(value, style, anchor, _) => {
                let node = Node::Scalar(Scalar {
                    value,
                    style: style.into(),
                    mark,
                });
                self.anchor(anchor, &node);
                self.insert(node);
            }
            Event::Alias(anchor) => {
                let node = self
                    .anchors
                    .get(&anchor)
                    .cloned()
                    .unwrap_or(Node::Alias { mark });
                self.insert(node);
            }
            _ => {}
        }
    }
}
