use crate::{errors::ImageError, image::ImageName};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeMap, fmt, iter::FromIterator};

/// Sorted, deduplicated set of container images
///
/// Images are keyed by their canonical string, so `nginx`,
/// `docker.io/library/nginx` and `nginx:latest` are a single entry. Iteration
/// is always in ascending order of canonical string, never insertion order,
/// so anything rendered from a set is reproducible.
///
/// Sets are values: [ImageSet::union] returns a new set and leaves both
/// inputs alone.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ImageSet {
    images: BTreeMap<String, ImageName>,
}

impl ImageSet {
    /// A set with no images in it
    pub fn empty() -> Self {
        ImageSet::default()
    }

    /// Parse a list of image references into a set
    ///
    /// Fails on the first reference that can't be parsed; no partial set is
    /// returned.
    ///
    /// ```
    /// # use kbundle::ImageSet;
    /// let set = ImageSet::new(&["a:v1", "a:v1", "docker.io/library/a:v1"]).unwrap();
    /// assert_eq!(set.strings(), vec!["docker.io/library/a:v1"]);
    /// assert!(ImageSet::new(&["a:v1", "x@bad"]).is_err());
    /// ```
    pub fn new<I, S>(references: I) -> Result<Self, ImageError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        references
            .into_iter()
            .map(|s| ImageName::parse(s.as_ref()))
            .collect()
    }

    /// A new set with every image from both sets
    pub fn union(&self, other: &ImageSet) -> ImageSet {
        let mut images = self.images.clone();
        for (key, image) in &other.images {
            images.entry(key.clone()).or_insert_with(|| image.clone());
        }
        ImageSet { images }
    }

    /// A new set which also includes this one image
    pub fn with(&self, image: &ImageName) -> ImageSet {
        self.union(&std::iter::once(image.clone()).collect())
    }

    /// Canonical strings for every image, in ascending order
    pub fn strings(&self) -> Vec<String> {
        self.images.keys().cloned().collect()
    }

    /// Iterate over the canonical form of each image, in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &ImageName> + '_ {
        self.images.values()
    }

    /// Is this image, under any of its spellings, in the set?
    pub fn contains(&self, image: &ImageName) -> bool {
        self.images.contains_key(&image.canonical_string())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl FromIterator<ImageName> for ImageSet {
    fn from_iter<T: IntoIterator<Item = ImageName>>(iter: T) -> Self {
        let mut images = BTreeMap::new();
        for image in iter {
            let canonical = image.canonical();
            images.insert(canonical.as_str().to_owned(), canonical);
        }
        ImageSet { images }
    }
}

impl fmt::Debug for ImageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.images.keys()).finish()
    }
}

impl Serialize for ImageSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.images.keys())
    }
}

impl<'de> Deserialize<'de> for ImageSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        ImageSet::new(&strings).map_err(de::Error::custom)
    }
}
