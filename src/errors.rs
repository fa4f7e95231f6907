//! Error types you might see while scanning or rewriting manifests

use thiserror::Error;

/// Errors in image reference text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// invalid image reference format
    #[error("invalid image reference format: {0:?}")]
    InvalidReferenceFormat(String),

    /// content digest has the wrong length for its algorithm
    #[error("content digest {digest:?} should have {expected} hex digits")]
    DigestLength { digest: String, expected: usize },
}

/// Errors while locating or rewriting images in a manifest stream
///
/// Document numbers count from zero within a single stream.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// structured data in the stream could not be decoded
    #[error("decode failed in document {document}: {source}")]
    Decode {
        document: usize,
        source: serde_yaml::Error,
    },

    /// yaml syntax error while building a format-preserving tree
    #[error("yaml syntax error in document {document}: {source}")]
    Syntax {
        document: usize,
        source: yaml_rust::ScanError,
    },

    /// a container image field holds an invalid reference
    #[error("invalid image in document {document}: {source}")]
    InvalidImage {
        document: usize,
        source: ImageError,
    },

    /// the scalar at this location can't be replaced without reformatting it
    #[error("can't rewrite {style:?} scalar {value:?} at line {line}, column {column}")]
    UnsupportedScalar {
        value: String,
        style: crate::manifest::ScalarStyle,
        line: usize,
        column: usize,
    },

    /// user-defined image path is not in the supported syntax
    #[error("invalid user-defined image path: {0:?}")]
    InvalidPath(String),
}

/// Errors in the bundle configuration model
#[derive(Error, Debug)]
pub enum ConfigError {
    /// json error
    #[error("json error: {0}")]
    JSON(#[from] serde_json::Error),

    /// image reference error
    #[error("image reference error: {0}")]
    Image(#[from] ImageError),
}
