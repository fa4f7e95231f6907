//! The node capabilities that structural queries are written against

use serde_yaml::Value;

/// What sort of node this is, independent of the tree representation
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    Mapping,
    Sequence,
    Scalar,
    Alias,
}

/// A node in a decoded document tree
///
/// Implemented for [serde_yaml::Value] and for the format-preserving
/// [crate::manifest::document::Node], so that each query is written once and
/// runs over both.
pub trait TreeNode: Sized {
    fn kind(&self) -> NodeKind;

    /// Text of a string scalar, if this is one
    fn scalar_str(&self) -> Option<&str>;

    /// Key and value pairs of a mapping, in document order
    fn map_entries(&self) -> Vec<(&Self, &Self)>;

    /// Elements of a sequence, in document order
    fn elements(&self) -> Vec<&Self>;

    /// Mapping values or sequence elements
    fn values(&self) -> Vec<&Self> {
        match self.kind() {
            NodeKind::Mapping => self.map_entries().into_iter().map(|(_, v)| v).collect(),
            NodeKind::Sequence => self.elements(),
            NodeKind::Scalar | NodeKind::Alias => Vec::new(),
        }
    }

    /// Every child node, mapping keys included
    fn children(&self) -> Vec<&Self> {
        match self.kind() {
            NodeKind::Mapping => self
                .map_entries()
                .into_iter()
                .flat_map(|(k, v)| vec![k, v])
                .collect(),
            _ => self.values(),
        }
    }

    /// Value stored under a string key in a mapping
    fn get(&self, key: &str) -> Option<&Self> {
        self.map_entries()
            .into_iter()
            .find(|(k, _)| k.scalar_str() == Some(key))
            .map(|(_, v)| v)
    }
}

/// Depth-first, pre-order list of a node and all of its descendants
pub fn walk<N: TreeNode>(root: &N) -> Vec<&N> {
    let mut visited = Vec::new();
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        visited.push(node);
        pending.extend(node.children().into_iter().rev());
    }
    visited
}

fn untagged(mut value: &Value) -> &Value {
    while let Value::Tagged(tagged) = value {
        value = &tagged.value;
    }
    value
}

impl TreeNode for Value {
    fn kind(&self) -> NodeKind {
        match untagged(self) {
            Value::Mapping(_) => NodeKind::Mapping,
            Value::Sequence(_) => NodeKind::Sequence,
            _ => NodeKind::Scalar,
        }
    }

    fn scalar_str(&self) -> Option<&str> {
        match untagged(self) {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn map_entries(&self) -> Vec<(&Self, &Self)> {
        match untagged(self) {
            Value::Mapping(mapping) => mapping.iter().collect(),
            _ => Vec::new(),
        }
    }

    fn elements(&self) -> Vec<&Self> {
        match untagged(self) {
            Value::Sequence(items) => items.iter().collect(),
            _ => Vec::new(),
        }
    }
}
