use crate::{
    errors::ImageError,
    image::{ContentDigest, DefaultRegistry, ImageVersion, Registry, Repository, Tag},
};
use regex::Regex;
use std::{collections::BTreeSet, ops::Range};

lazy_static! {
    static ref DOCKER_HUB: DefaultRegistry = DefaultRegistry::new();
}

/// Parsed Docker-style image reference
///
/// This is an owned struct representing a docker "reference" (like a URI) which
/// refers to an image, optionally at a specific version, which can be fetched
/// from a registry server (possibly the configured default).
///
/// This tries to be format-compatible with Docker including its quirks.
///
/// A complete image name contains a [Registry], [Repository], [Tag], and
/// [ContentDigest] in that order. Only the [Repository] component is mandatory.
///
/// The [Tag] always begins with a `:` and the [ContentDigest] with an `@`, but
/// delineating the optional [Registry] and the first section of the
/// [Repository] requires heuristics. If this first section includes any dot (.)
/// or colon (:) characters it is assumed to be a registry server. The
/// additional exception is a special case for "localhost", which is always
/// interpreted as a registry name.
///
/// An [ImageName] keeps the text exactly as it was written, and compares equal
/// only to the same text. Use [ImageName::canonical] or
/// [ImageName::is_equivalent] to compare image identity.
#[derive(Clone)]
pub struct ImageName {
    serialized: String,
    registry_pos: Option<Range<usize>>,
    repository_pos: Range<usize>,
    tag_pos: Option<Range<usize>>,
    digest_pos: Option<Range<usize>>,
}

serialized_str_impls!(ImageName);

impl ImageName {
    /// Returns a reference to the existing string representation of an
    /// [ImageName]
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Parse an [ImageName] from its component pieces
    ///
    /// This may fail either because of a problem with one of the components,
    /// or because the resulting path would be parsed in a manner other than
    /// intended. For example, a registry name could be parsed as the first
    /// section of the repository path.
    pub fn from_parts(
        registry: Option<&str>,
        repository: &str,
        tag: Option<&str>,
        digest: Option<&str>,
    ) -> Result<Self, ImageError> {
        let assembled = ImageName::assemble(registry, repository, tag, digest);
        let parsed = ImageName::parse(assembled.as_str())?;
        if parsed.as_parts() == assembled.as_parts() {
            Ok(parsed)
        } else {
            // Parsing ambiguity
            Err(ImageError::InvalidReferenceFormat(assembled.serialized))
        }
    }

    /// Join already-validated components without re-parsing the result
    fn assemble(
        registry: Option<&str>,
        repository: &str,
        tag: Option<&str>,
        digest: Option<&str>,
    ) -> Self {
        let mut serialized = String::new();
        let span = |serialized: &mut String, prefix: &str, part: &str| {
            serialized.push_str(prefix);
            let start = serialized.len();
            serialized.push_str(part);
            start..serialized.len()
        };
        let registry_pos = registry.map(|r| span(&mut serialized, "", r));
        let repository_pos = span(
            &mut serialized,
            if registry.is_some() { "/" } else { "" },
            repository,
        );
        let tag_pos = tag.map(|t| span(&mut serialized, ":", t));
        let digest_pos = digest.map(|d| span(&mut serialized, "@", d));
        ImageName {
            serialized,
            registry_pos,
            repository_pos,
            tag_pos,
            digest_pos,
        }
    }

    /// Return references to the parsed components within this [ImageName]
    pub fn as_parts(&self) -> (Option<&str>, &str, Option<&str>, Option<&str>) {
        (
            self.registry_str(),
            self.repository_str(),
            self.tag_str(),
            self.content_digest_str(),
        )
    }

    /// Returns the most specific available version
    ///
    /// If the image name includes a digest, this returns the digest. Otherwise,
    /// it returns the tag, defaulting to `latest` if no tag is set.
    pub fn version(&self) -> ImageVersion {
        if let Some(digest) = self.content_digest() {
            return ImageVersion::ContentDigest(digest);
        }
        ImageVersion::Tag(self.tag().unwrap_or_else(Tag::latest))
    }

    /// Parse a [prim@str] as an [ImageName]
    pub fn parse(s: &str) -> Result<Self, ImageError> {
        lazy_static! {
            static ref HAS_REGISTRY: Regex = Regex::new(concat!(
                "^",
                "(?:", // alternatives group
                /* */ "(?:", // one option: a domain with at least one dot
                /* -- */ "(?:", // First domain component
                /* -- -- */ "[a-zA-Z0-9]|",
                /* -- -- */ "[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]",
                /* -- */ ")",
                /* -- */ "(?:", // Additional domain components
                /* -- -- */ "\\.",
                /* -- -- */ "(?:",
                /* -- -- -- */ "[a-zA-Z0-9]|",
                /* -- -- -- */ "[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]",
                /* -- -- */ ")",
                /* -- */ ")+",
                /* -- */ "(?::[0-9]+)?", // Optional port number
                /*  */ ")",
                /* */ "|(?:", // another option: no dots, but there's a port number
                /* -- */ "(?:", // Only domain component
                /* -- -- */ "[a-zA-Z0-9]|",
                /* -- -- */ "[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]",
                /* -- */ ")",
                /* -- */ "(?::[0-9]+)", // port number
                /*  */ ")",
                /* */ "|(?:", // special case for localhost
                /* -- */ "localhost",
                /* -- */ "(?::[0-9]+)?", // Optional port number
                /*  */ ")",
                ")", // end of alternatives
                "/", // done matching at the first slash, which is not optional here
            )).unwrap();
            static ref WITH_REGISTRY: Regex = Regex::new(&format!(
                "^{}/{}(?::{})?(?:@{})?$",
                Registry::regex_str(),
                Repository::regex_str(),
                Tag::regex_str(),
                ContentDigest::regex_str()
            ))
            .unwrap();
            static ref NO_REGISTRY: Regex = Regex::new(&format!(
                "^{}(?::{})?(?:@{})?$",
                Repository::regex_str(),
                Tag::regex_str(),
                ContentDigest::regex_str()
            ))
            .unwrap();
        }
        let invalid = || ImageError::InvalidReferenceFormat(s.to_owned());
        let captures = if HAS_REGISTRY.is_match(s) {
            WITH_REGISTRY.captures(s)
        } else {
            NO_REGISTRY.captures(s)
        }
        .ok_or_else(invalid)?;

        let name = ImageName {
            serialized: s.to_owned(),
            registry_pos: captures.name("reg").map(|m| m.range()),
            repository_pos: captures.name("repo").ok_or_else(invalid)?.range(),
            tag_pos: captures.name("tag").map(|m| m.range()),
            digest_pos: captures.name("dig").map(|m| m.range()),
        };

        // Validate the digest beyond its grammar, e.g. sha256 length
        if let Some(digest) = name.content_digest_str() {
            ContentDigest::parse(digest)?;
        }
        if let Some(registry) = name.registry_str() {
            Registry::parse(registry)?;
        }
        Ok(name)
    }

    /// Returns a reference to the optional registry portion of the string.
    pub fn registry_str(&self) -> Option<&str> {
        self.registry_pos
            .as_ref()
            .map(|pos| &self.serialized[pos.clone()])
    }

    /// Returns a reference to the repository portion of the string
    pub fn repository_str(&self) -> &str {
        &self.serialized[self.repository_pos.clone()]
    }

    /// Returns a reference to the optional tag portion of the string.
    pub fn tag_str(&self) -> Option<&str> {
        self.tag_pos
            .as_ref()
            .map(|pos| &self.serialized[pos.clone()])
    }

    /// Returns a reference to the optional digest portion of the string.
    pub fn content_digest_str(&self) -> Option<&str> {
        self.digest_pos
            .as_ref()
            .map(|pos| &self.serialized[pos.clone()])
    }

    /// Returns the registry portion as a new object
    pub fn registry(&self) -> Option<Registry> {
        self.registry_str()
            .map(|s| Registry::parse(s).expect("already parsed"))
    }

    /// Returns the repository portion as a new object
    pub fn repository(&self) -> Repository {
        Repository::parse(self.repository_str()).expect("already parsed")
    }

    /// Returns the tag portion as a new object
    pub fn tag(&self) -> Option<Tag> {
        self.tag_str().map(|s| Tag::parse(s).expect("already parsed"))
    }

    /// Returns the digest portion as a new object
    pub fn content_digest(&self) -> Option<ContentDigest> {
        self.content_digest_str()
            .map(|s| ContentDigest::parse(s).expect("already parsed"))
    }

    /// Fully qualified form of this reference under the Docker Hub defaults
    ///
    /// The result always names its registry and exactly one version, a digest
    /// if this name has one and a tag otherwise.
    ///
    /// ```
    /// # use kbundle::ImageName;
    /// let name = ImageName::parse("nginx:1.7.9").unwrap();
    /// assert_eq!(name.canonical().as_str(), "docker.io/library/nginx:1.7.9");
    /// ```
    pub fn canonical(&self) -> ImageName {
        self.canonical_with(&DOCKER_HUB)
    }

    /// Fully qualified form of this reference under custom default registry
    /// settings
    pub fn canonical_with(&self, defaults: &DefaultRegistry) -> ImageName {
        let (registry, repository) =
            defaults.resolve(self.registry().as_ref(), &self.repository());
        let version = self.version();
        let (tag, digest) = match &version {
            ImageVersion::Tag(tag) => (Some(tag.as_str()), None),
            ImageVersion::ContentDigest(digest) => (None, Some(digest.as_str())),
        };
        ImageName::assemble(
            Some(registry.as_str()),
            repository.as_str(),
            tag,
            digest,
        )
    }

    /// The canonical form as a string, used as the identity of an image in
    /// sets and in persisted configuration
    pub fn canonical_string(&self) -> String {
        self.canonical().serialized
    }

    /// Every spelling of this reference that denotes the same image
    ///
    /// This includes the canonical form, the forms with the default registry
    /// omitted or written under one of its aliases, the short form of
    /// official `library/` images, and the form with an implied `:latest`
    /// left out.
    pub fn synonyms(&self) -> BTreeSet<String> {
        self.synonyms_with(&DOCKER_HUB)
    }

    /// Every spelling of this reference under custom default registry settings
    pub fn synonyms_with(&self, defaults: &DefaultRegistry) -> BTreeSet<String> {
        let canonical = self.canonical_with(defaults);
        let (registry, repository) = match (canonical.registry(), canonical.repository()) {
            (Some(registry), repository) => (registry, repository),
            (None, _) => return std::iter::once(canonical.serialized).collect(),
        };

        let version = canonical.version();
        let mut versions = vec![version.suffix()];
        match &version {
            ImageVersion::Tag(tag) if tag.is_latest() => versions.push(String::new()),
            ImageVersion::ContentDigest(digest) => {
                if let Some(tag) = self.tag_str() {
                    versions.push(format!(":{}@{}", tag, digest));
                }
            }
            ImageVersion::Tag(_) => {}
        }

        let mut synonyms = BTreeSet::new();
        for registry_prefix in defaults.registry_spellings(&registry) {
            for repository in defaults.repository_spellings(&registry, &repository) {
                for version in &versions {
                    let candidate = format!("{}{}{}", registry_prefix, repository, version);
                    // Leaving out the registry can change how the first
                    // repository component is read
                    let same_image = ImageName::parse(&candidate)
                        .map(|parsed| parsed.canonical_with(defaults) == canonical)
                        .unwrap_or(false);
                    if same_image {
                        synonyms.insert(candidate);
                    }
                }
            }
        }
        synonyms
    }

    /// Do these two references denote the same image?
    pub fn is_equivalent(&self, other: &ImageName) -> bool {
        !self.synonyms().is_disjoint(&other.synonyms())
    }
}
