//! Boolean predicates over document nodes
//!
//! Predicates are built once from small constructor functions and then shared;
//! none of them hold mutable state.

use crate::manifest::node::{walk, NodeKind, TreeNode};
use std::{fmt, sync::Arc};

/// A shareable test against one node of a document tree
pub struct Predicate<N> {
    test: Arc<dyn Fn(&N) -> bool + Send + Sync>,
}

impl<N> Clone for Predicate<N> {
    fn clone(&self) -> Self {
        Predicate {
            test: self.test.clone(),
        }
    }
}

impl<N> fmt::Debug for Predicate<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}

impl<N> Predicate<N> {
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&N) -> bool + Send + Sync + 'static,
    {
        Predicate {
            test: Arc::new(test),
        }
    }

    pub fn matches(&self, node: &N) -> bool {
        (self.test)(node)
    }
}

/// Node is a mapping, a sequence, a scalar, or an alias
pub fn with_kind<N: TreeNode + 'static>(kind: NodeKind) -> Predicate<N> {
    Predicate::new(move |node: &N| node.kind() == kind)
}

/// Node is a string scalar with exactly this text
pub fn with_string_value<N: TreeNode + 'static>(value: &str) -> Predicate<N> {
    let value = value.to_owned();
    Predicate::new(move |node: &N| node.scalar_str() == Some(value.as_str()))
}

/// Node is any string scalar
pub fn string_value<N: TreeNode + 'static>() -> Predicate<N> {
    Predicate::new(|node: &N| node.scalar_str().is_some())
}

/// Node is a mapping with at least one entry whose key and value both match
pub fn with_map_key_value<N: TreeNode + 'static>(
    key: Predicate<N>,
    value: Predicate<N>,
) -> Predicate<N> {
    Predicate::new(move |node: &N| {
        node.map_entries()
            .into_iter()
            .any(|(k, v)| key.matches(k) && value.matches(v))
    })
}

/// Some direct mapping value or sequence element matches
pub fn with_nested_value<N: TreeNode + 'static>(inner: Predicate<N>) -> Predicate<N> {
    Predicate::new(move |node: &N| node.values().into_iter().any(|v| inner.matches(v)))
}

/// The node itself or anything below it matches
pub fn any_descendant<N: TreeNode + 'static>(inner: Predicate<N>) -> Predicate<N> {
    Predicate::new(move |node: &N| walk(node).into_iter().any(|n| inner.matches(n)))
}

/// Every one of the predicates matches
///
/// An empty list matches every node.
pub fn intersect<N: TreeNode + 'static>(all: Vec<Predicate<N>>) -> Predicate<N> {
    Predicate::new(move |node: &N| all.iter().all(|p| p.matches(node)))
}
