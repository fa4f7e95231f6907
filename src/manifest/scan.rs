use crate::{
    config::UserDefinedImage,
    errors::ManifestError,
    image::{ImageName, ImageSet},
    manifest::{node::TreeNode, path::ImageRule, query::PodTemplateQuery},
};
use serde::Deserialize;
use serde_yaml::Value;
use std::borrow::Borrow;

/// What the scanner does with an image field that isn't a valid reference
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvalidImagePolicy {
    /// Fail the whole scan
    Fail,
    /// Log a warning and carry on
    Skip,
}

impl Default for InvalidImagePolicy {
    fn default() -> Self {
        InvalidImagePolicy::Fail
    }
}

/// Collects the container images referenced by a stream of documents
#[derive(Clone, Debug)]
pub struct ImageScanner<N = Value> {
    query: PodTemplateQuery<N>,
    rules: Vec<ImageRule>,
    invalid_images: InvalidImagePolicy,
}

impl<N: TreeNode + 'static> ImageScanner<N> {
    pub fn new() -> Self {
        ImageScanner {
            query: PodTemplateQuery::new(),
            rules: Vec::new(),
            invalid_images: InvalidImagePolicy::default(),
        }
    }

    pub fn invalid_images(mut self, policy: InvalidImagePolicy) -> Self {
        self.invalid_images = policy;
        self
    }

    /// Also collect images from fields named by user-defined rules
    pub fn user_defined_images(
        mut self,
        rules: &[UserDefinedImage],
    ) -> Result<Self, ManifestError> {
        self.rules = ImageRule::compile_all(rules)?;
        Ok(self)
    }

    /// Images referenced by one document
    ///
    /// `document` is only used to label errors.
    pub fn document_images(&self, document: usize, root: &N) -> Result<ImageSet, ManifestError> {
        let fields = self
            .query
            .image_fields(root)
            .into_iter()
            .chain(self.rules.iter().flat_map(|rule| rule.image_fields(root)));

        let mut images = Vec::new();
        for text in fields.filter_map(|field| field.scalar_str()) {
            if text.is_empty() {
                continue;
            }
            match ImageName::parse(text) {
                Ok(image) => images.push(image),
                Err(err) => match self.invalid_images {
                    InvalidImagePolicy::Fail => {
                        return Err(ManifestError::InvalidImage {
                            document,
                            source: err,
                        })
                    }
                    InvalidImagePolicy::Skip => {
                        log::warn!("skipping image in document {}: {}", document, err)
                    }
                },
            }
        }
        Ok(images.into_iter().collect())
    }

    /// Union of the images referenced by every document in a stream
    ///
    /// The first error ends the scan; no partial set is returned.
    pub fn scan_documents<I, B>(&self, documents: I) -> Result<ImageSet, ManifestError>
    where
        I: IntoIterator<Item = Result<B, ManifestError>>,
        B: Borrow<N>,
    {
        let mut images = ImageSet::empty();
        for (index, document) in documents.into_iter().enumerate() {
            let document = document?;
            let found = self.document_images(index, Borrow::<N>::borrow(&document))?;
            log::debug!("document {}: {} images", index, found.len());
            images = images.union(&found);
        }
        Ok(images)
    }
}

impl ImageScanner<Value> {
    /// Scan YAML or JSON text, which may hold several documents
    pub fn scan_str(&self, text: &str) -> Result<ImageSet, ManifestError> {
        self.scan_documents(decode_documents(text))
    }
}

impl<N: TreeNode + 'static> Default for ImageScanner<N> {
    fn default() -> Self {
        ImageScanner::new()
    }
}

/// Decode each document in a YAML or JSON stream into a generic value
pub fn decode_documents(text: &str) -> impl Iterator<Item = Result<Value, ManifestError>> + '_ {
    serde_yaml::Deserializer::from_str(text)
        .enumerate()
        .map(|(document, de)| {
            Value::deserialize(de).map_err(|source| ManifestError::Decode { document, source })
        })
}

/// Images referenced by pod templates anywhere in a YAML or JSON stream
///
/// ```
/// let images = kbundle::scan_images("
/// kind: Pod
/// spec:
///   containers:
///   - name: web
///     image: nginx:1.7.9
/// ").unwrap();
/// assert_eq!(images.strings(), vec!["docker.io/library/nginx:1.7.9"]);
/// ```
pub fn scan_images(text: &str) -> Result<ImageSet, ManifestError> {
    ImageScanner::<Value>::new().scan_str(text)
}
