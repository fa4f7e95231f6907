use crate::image::{Registry, Repository};

/// Rules for references that omit their registry, or that name the default
/// registry under one of its other names
///
/// These rules decide both the canonical form of a reference and the set of
/// shorthand spellings that mean the same image.
#[derive(Clone, Debug)]
pub struct DefaultRegistry {
    /// Canonical name of the default registry
    pub canonical_name: Registry,
    /// This registry is also known under additional names
    pub also_known_as: Vec<Registry>,
    /// Use this prefix when a repository on the default registry has only a
    /// single path component
    pub library_prefix: Option<Repository>,
}

impl From<Registry> for DefaultRegistry {
    fn from(canonical_name: Registry) -> Self {
        DefaultRegistry {
            canonical_name,
            also_known_as: vec![],
            library_prefix: None,
        }
    }
}

impl Default for DefaultRegistry {
    fn default() -> Self {
        DefaultRegistry::new()
    }
}

impl DefaultRegistry {
    /// Return the built-in Docker Hub defaults
    pub fn new() -> Self {
        let parse = |s: &str| Registry::parse(s).expect("built-in registry name");
        DefaultRegistry {
            canonical_name: parse("docker.io"),
            also_known_as: vec![
                parse("index.docker.io"),
                parse("registry-1.docker.io"),
                parse("registry.hub.docker.com"),
            ],
            library_prefix: Some(Repository::parse("library").expect("built-in prefix")),
        }
    }

    /// Check whether a particular registry is considered default under these
    /// settings
    ///
    /// Returns true if the given registry is None or if it matches either the
    /// `canonical_name` or any of the `also_known_as` settings here.
    pub fn is_default(&self, registry: Option<&Registry>) -> bool {
        match registry {
            None => true,
            Some(registry) => {
                registry == &self.canonical_name || self.also_known_as.contains(registry)
            }
        }
    }

    /// Determine the canonical registry and complete repository path for a
    /// registry and repository as written
    pub fn resolve(
        &self,
        registry: Option<&Registry>,
        repository: &Repository,
    ) -> (Registry, Repository) {
        if !self.is_default(registry) {
            if let Some(registry) = registry {
                return (registry.clone(), repository.clone());
            }
        }
        let complete_repo = match &self.library_prefix {
            Some(prefix) if repository.is_single_component() => prefix.join(repository),
            _ => repository.clone(),
        };
        (self.canonical_name.clone(), complete_repo)
    }

    /// Every way of writing the registry part of a reference, including the
    /// trailing slash, or the empty string when it may be omitted
    pub fn registry_spellings(&self, registry: &Registry) -> Vec<String> {
        if self.is_default(Some(registry)) {
            let mut spellings = vec![String::new(), format!("{}/", self.canonical_name)];
            spellings.extend(self.also_known_as.iter().map(|r| format!("{}/", r)));
            spellings
        } else {
            vec![format!("{}/", registry)]
        }
    }

    /// Every way of writing a complete repository path on the given registry
    pub fn repository_spellings(
        &self,
        registry: &Registry,
        repository: &Repository,
    ) -> Vec<Repository> {
        let mut spellings = vec![repository.clone()];
        if self.is_default(Some(registry)) {
            if let Some(short) = self
                .library_prefix
                .as_ref()
                .and_then(|prefix| repository.strip_prefix(prefix))
                .filter(Repository::is_single_component)
            {
                spellings.push(short);
            }
        }
        spellings
    }
}
