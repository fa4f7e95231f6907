use crate::{
    errors::ImageError,
    image::{ContentDigest, Tag},
};
use std::{fmt, str::FromStr};

/// Either an image tag or a content digest
///
/// An [crate::image::ImageName] may be written with a tag, a digest, both or
/// neither, but it always selects exactly one version: the digest when there
/// is one, otherwise the tag, otherwise the special tag `latest`. Canonical
/// strings are built from this selector.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ImageVersion {
    Tag(Tag),
    ContentDigest(ContentDigest),
}

impl ImageVersion {
    /// Returns a reference to the existing string representation of an
    /// [ImageVersion]
    pub fn as_str(&self) -> &str {
        match self {
            ImageVersion::Tag(tag) => tag.as_str(),
            ImageVersion::ContentDigest(content_digest) => content_digest.as_str(),
        }
    }

    /// Parse a [prim@str] as an [ImageVersion]
    pub fn parse(s: &str) -> Result<Self, ImageError> {
        if s.contains(':') {
            Ok(ImageVersion::ContentDigest(ContentDigest::parse(s)?))
        } else {
            Ok(ImageVersion::Tag(Tag::parse(s)?))
        }
    }

    /// The separator and text that follow a repository in a reference
    ///
    /// ```
    /// # use kbundle::image::ImageVersion;
    /// assert_eq!(ImageVersion::parse("v1").unwrap().suffix(), ":v1");
    /// ```
    pub fn suffix(&self) -> String {
        match self {
            ImageVersion::Tag(tag) => format!(":{}", tag),
            ImageVersion::ContentDigest(digest) => format!("@{}", digest),
        }
    }

    /// Is this version a content digest?
    pub fn is_content_digest(&self) -> bool {
        matches!(self, ImageVersion::ContentDigest(_))
    }

    /// Is this version a tag?
    pub fn is_tag(&self) -> bool {
        matches!(self, ImageVersion::Tag(_))
    }
}

impl FromStr for ImageVersion {
    type Err = ImageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageVersion::parse(s)
    }
}

impl fmt::Display for ImageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for ImageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
