use crate::{
    config::UserDefinedImage,
    errors::{ImageError, ManifestError},
    image::ImageName,
    manifest::{
        document::{Document, Node, Scalar},
        path::ImageRule,
        query::PodTemplateQuery,
    },
};
use std::{collections::BTreeMap, fmt, iter::FromIterator};

/// Mapping from old image references to their new locations
///
/// Each entry is keyed by the canonical form of its old reference, so an old
/// image can only be mapped once however it was spelled. Lookups accept any
/// synonym of an old reference. When more than one entry could match the
/// same text, the entry with the lowest canonical old reference wins.
#[derive(Clone, Default)]
pub struct ImageMap {
    entries: BTreeMap<String, (ImageName, ImageName)>,
    by_synonym: BTreeMap<String, String>,
}

impl ImageMap {
    pub fn new() -> Self {
        ImageMap::default()
    }

    /// Parse a list of `(old, new)` reference pairs
    ///
    /// ```
    /// # use kbundle::ImageMap;
    /// let map = ImageMap::from_pairs(vec![("nginx:1.7.9", "example.com/nginx:1.7.9")]).unwrap();
    /// let new = map.replacement("docker.io/library/nginx:1.7.9").unwrap();
    /// assert_eq!(new.as_str(), "example.com/nginx:1.7.9");
    /// assert!(map.replacement("nginx").is_none());
    /// ```
    pub fn from_pairs<I, A, B>(pairs: I) -> Result<Self, ImageError>
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let mut map = ImageMap::new();
        for (old, new) in pairs {
            map.insert(ImageName::parse(old.as_ref())?, ImageName::parse(new.as_ref())?);
        }
        Ok(map)
    }

    /// Map an old image to a new one, replacing any earlier mapping for an
    /// equivalent old image
    pub fn insert(&mut self, old: ImageName, new: ImageName) {
        self.entries.insert(old.canonical_string(), (old, new));
        self.reindex();
    }

    fn reindex(&mut self) {
        self.by_synonym.clear();
        for (key, (old, _)) in &self.entries {
            for synonym in old.synonyms() {
                self.by_synonym.entry(synonym).or_insert_with(|| key.clone());
            }
        }
    }

    /// The new image for text that spells one of the old images
    ///
    /// Text that isn't itself a listed synonym still matches through its
    /// canonical form, so a reference pinned as `repo:tag@digest` finds the
    /// entry for `repo@digest`.
    ///
    /// ```
    /// # use kbundle::ImageMap;
    /// let digest = "sha256:9ff6923f6c567573103816796df283d03256bc7a9edb7450542e106b349cf34a";
    /// let old = format!("docker.io/library/nginx@{}", digest);
    /// let new = format!("example.com/nginx@{}", digest);
    /// let map = ImageMap::from_pairs(vec![(old, new.clone())]).unwrap();
    /// let pinned = format!("nginx:1.7.9@{}", digest);
    /// assert_eq!(map.replacement(&pinned).unwrap().as_str(), new);
    /// ```
    pub fn replacement(&self, text: &str) -> Option<&ImageName> {
        let key = match self.by_synonym.get(text) {
            Some(key) => key,
            None => {
                let canonical = ImageName::parse(text).ok()?.canonical_string();
                self.by_synonym.get(&canonical)?
            }
        };
        self.entries.get(key).map(|(_, new)| new)
    }

    /// Pairs of old and new images, in ascending order of canonical old image
    pub fn iter(&self) -> impl Iterator<Item = (&ImageName, &ImageName)> + '_ {
        self.entries.values().map(|(old, new)| (old, new))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ImageName, ImageName)> for ImageMap {
    fn from_iter<T: IntoIterator<Item = (ImageName, ImageName)>>(iter: T) -> Self {
        let mut map = ImageMap::new();
        for (old, new) in iter {
            map.entries.insert(old.canonical_string(), (old, new));
        }
        map.reindex();
        map
    }
}

impl fmt::Debug for ImageMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Rewrites image references in place, leaving the rest of the text alone
#[derive(Clone, Debug, Default)]
pub struct ImageRewriter {
    query: PodTemplateQuery<Node>,
    rules: Vec<ImageRule>,
}

impl ImageRewriter {
    pub fn new() -> Self {
        ImageRewriter::default()
    }

    /// Also rewrite images in fields named by user-defined rules
    pub fn user_defined_images(
        mut self,
        rules: &[UserDefinedImage],
    ) -> Result<Self, ManifestError> {
        self.rules = ImageRule::compile_all(rules)?;
        Ok(self)
    }

    /// Replace every mapped image in a parsed document stream
    ///
    /// Returns the number of scalars replaced. Nothing is replaced if any
    /// matching scalar can't be rewritten in place.
    pub fn rewrite_document(
        &self,
        document: &mut Document,
        map: &ImageMap,
    ) -> Result<usize, ManifestError> {
        let mut targets: BTreeMap<usize, (Scalar, String)> = BTreeMap::new();
        for (index, root) in document.roots().iter().enumerate() {
            let fields = self
                .query
                .image_fields(root)
                .into_iter()
                .chain(self.rules.iter().flat_map(|rule| rule.image_fields(root)));
            for scalar in fields.filter_map(Node::as_scalar) {
                if let Some(new) = map.replacement(&scalar.value) {
                    log::debug!(
                        "document {}, line {}: {} -> {}",
                        index,
                        scalar.mark.line,
                        scalar.value,
                        new
                    );
                    targets
                        .entry(scalar.mark.offset)
                        .or_insert_with(|| (scalar.clone(), new.canonical_string()));
                }
            }
        }

        let mut staged = document.clone();
        for (scalar, new) in targets.values() {
            staged.replace_scalar(scalar, new)?;
        }
        *document = staged;
        Ok(targets.len())
    }

    /// Rewrite a YAML or JSON stream, which may hold several documents
    pub fn rewrite(&self, text: &str, map: &ImageMap) -> Result<String, ManifestError> {
        let mut document = Document::parse(text)?;
        let count = self.rewrite_document(&mut document, map)?;
        log::debug!("replaced {} images", count);
        Ok(document.encode())
    }
}

/// Point every image in a manifest stream that the map knows about at its
/// new location
///
/// Only the text of the replaced image scalars changes.
///
/// ```
/// # use kbundle::{rewrite_images, ImageMap};
/// let map = ImageMap::from_pairs(vec![("nginx:1.7.9", "example.com/nginx:1.7.9")]).unwrap();
/// let manifest = "
/// kind: Pod
/// spec:
///   containers:
///   - image: 'docker.io/library/nginx:1.7.9' # web
/// ";
/// assert_eq!(
///     rewrite_images(manifest, &map).unwrap(),
///     manifest.replace("docker.io/library/nginx:1.7.9", "example.com/nginx:1.7.9")
/// );
/// ```
pub fn rewrite_images(text: &str, map: &ImageMap) -> Result<String, ManifestError> {
    ImageRewriter::new().rewrite(text, map)
}
