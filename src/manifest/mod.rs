//! Locating container images inside Kubernetes manifests
//!
//! Queries are written against the [TreeNode] capability, so the same
//! pod-template search runs over generic [serde_yaml::Value] trees for
//! scanning and over the format-preserving [Document] tree for rewriting.


pub mod document;
pub mod node;
pub mod path;
pub mod predicate;
pub mod query;
pub mod rewrite;
pub mod scan;

pub use document::{Document, Mark, Node, Scalar, ScalarStyle};
pub use node::{walk, NodeKind, TreeNode};
pub use path::{FieldPath, ImageRule};
pub use predicate::Predicate;
pub use query::PodTemplateQuery;
pub use rewrite::{rewrite_images, ImageMap, ImageRewriter};
pub use scan::{decode_documents, scan_images, ImageScanner, InvalidImagePolicy};
