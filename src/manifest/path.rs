use crate::{
    config::{ImageResultType, UserDefinedImage},
    errors::ManifestError,
    manifest::node::{NodeKind, TreeNode},
};
use regex::Regex;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Step {
    Key(String),
    Index(usize),
    Each,
}

/// A field path in the small JSONPath subset used by user-defined image rules
///
/// Paths look like `{.spec.images[*].ref}`: dotted mapping keys, `[*]` for
/// every element of a sequence and `[n]` for one element. The braces are
/// optional.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldPath {
    serialized: String,
    steps: Vec<Step>,
}

impl FieldPath {
    pub fn parse(s: &str) -> Result<Self, ManifestError> {
        lazy_static! {
            static ref STEP: Regex = Regex::new(r"\.([^.\[\]{}]+)|\[(\*|[0-9]+)\]").unwrap();
        }
        let invalid = || ManifestError::InvalidPath(s.to_owned());
        let trimmed = s.trim();
        let inner = match (trimmed.strip_prefix('{'), trimmed.strip_suffix('}')) {
            (Some(_), Some(_)) => &trimmed[1..trimmed.len() - 1],
            (None, None) => trimmed,
            _ => return Err(invalid()),
        };
        if inner.is_empty() {
            return Err(invalid());
        }

        let mut steps = Vec::new();
        let mut position = 0;
        for captures in STEP.captures_iter(inner) {
            let whole = captures.get(0).ok_or_else(invalid)?;
            if whole.start() != position {
                return Err(invalid());
            }
            position = whole.end();
            steps.push(match (captures.get(1), captures.get(2)) {
                (Some(key), _) => Step::Key(key.as_str().to_owned()),
                (None, Some(index)) if index.as_str() == "*" => Step::Each,
                (None, Some(index)) => Step::Index(index.as_str().parse().map_err(|_| invalid())?),
                (None, None) => return Err(invalid()),
            });
        }
        if position != inner.len() {
            return Err(invalid());
        }
        Ok(FieldPath {
            serialized: s.to_owned(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Every node the path leads to, in document order
    pub fn resolve<'a, N: TreeNode>(&self, root: &'a N) -> Vec<&'a N> {
        let mut current = vec![root];
        for step in &self.steps {
            current = current
                .into_iter()
                .flat_map(|node| match step {
                    Step::Key(key) => node.get(key).into_iter().collect::<Vec<_>>(),
                    Step::Index(index) => {
                        node.elements().into_iter().nth(*index).into_iter().collect()
                    }
                    Step::Each => node.elements(),
                })
                .collect();
        }
        current
    }
}

/// A compiled user-defined image rule
#[derive(Clone, Debug)]
pub struct ImageRule {
    api_version: String,
    kind: String,
    path: FieldPath,
    result_type: ImageResultType,
}

impl ImageRule {
    pub fn compile(rule: &UserDefinedImage) -> Result<Self, ManifestError> {
        Ok(ImageRule {
            api_version: rule.api_version.clone(),
            kind: rule.kind.clone(),
            path: FieldPath::parse(&rule.json_path)?,
            result_type: rule.result_type,
        })
    }

    pub fn compile_all(rules: &[UserDefinedImage]) -> Result<Vec<Self>, ManifestError> {
        rules.iter().map(ImageRule::compile).collect()
    }

    /// Does this rule apply to a document with this root?
    pub fn applies_to<N: TreeNode>(&self, root: &N) -> bool {
        let field = |name: &str| root.get(name).and_then(|value| value.scalar_str());
        field("apiVersion") == Some(self.api_version.as_str())
            && field("kind") == Some(self.kind.as_str())
    }

    /// String scalars holding images in a document, or nothing if the rule
    /// doesn't apply to it
    pub fn image_fields<'a, N: TreeNode>(&self, root: &'a N) -> Vec<&'a N> {
        if !self.applies_to(root) {
            return Vec::new();
        }
        let mut fields = Vec::new();
        for node in self.path.resolve(root) {
            match (node.kind(), self.result_type) {
                (NodeKind::Scalar, _) if node.scalar_str().is_some() => fields.push(node),
                (NodeKind::Sequence, ImageResultType::Multiple) => fields.extend(
                    node.elements()
                        .into_iter()
                        .filter(|item| item.scalar_str().is_some()),
                ),
                (kind, result_type) => log::debug!(
                    "{} {}: path {} leads to a {:?} node, expected {:?} images",
                    self.api_version,
                    self.kind,
                    self.path.as_str(),
                    kind,
                    result_type
                ),
            }
        }
        fields
    }
}
