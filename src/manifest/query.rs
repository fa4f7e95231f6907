use crate::manifest::{
    node::{walk, NodeKind, TreeNode},
    predicate::{
        intersect, string_value, with_kind, with_map_key_value, with_nested_value,
        with_string_value, Predicate,
    },
};

/// The fixed structural query that locates container images
///
/// A pod template is any mapping with a `spec` key whose value is a mapping
/// with a `containers` key, whose value in turn is a sequence with at least
/// one mapping element holding a string `image`. This matches Pods directly
/// and the templates embedded in Deployments, Jobs, CronJobs and custom
/// resources, at any depth.
#[derive(Clone, Debug)]
pub struct PodTemplateQuery<N> {
    pod_template: Predicate<N>,
    containers: Predicate<N>,
    image: Predicate<N>,
}

impl<N: TreeNode + 'static> PodTemplateQuery<N> {
    pub fn new() -> Self {
        let image = string_value();
        let containers = intersect(vec![
            with_kind(NodeKind::Sequence),
            with_nested_value(with_map_key_value(with_string_value("image"), image.clone())),
        ]);
        let spec = intersect(vec![
            with_kind(NodeKind::Mapping),
            with_map_key_value(with_string_value("containers"), containers.clone()),
        ]);
        let pod_template = intersect(vec![
            with_kind(NodeKind::Mapping),
            with_map_key_value(with_string_value("spec"), spec),
        ]);
        PodTemplateQuery {
            pod_template,
            containers,
            image,
        }
    }

    pub fn is_pod_template(&self, node: &N) -> bool {
        self.pod_template.matches(node)
    }

    /// Every pod template in a document, in depth-first order
    pub fn pod_templates<'a>(&self, root: &'a N) -> Vec<&'a N> {
        walk(root)
            .into_iter()
            .filter(|node| self.is_pod_template(node))
            .collect()
    }

    /// Every container `image` scalar in a document, in document order
    ///
    /// Containers without a string image are passed over. An image inside
    /// nested pod templates is reported once for each template that encloses
    /// it, so callers deduplicate by identity.
    pub fn image_fields<'a>(&self, root: &'a N) -> Vec<&'a N> {
        let mut fields = Vec::new();
        for template in self.pod_templates(root) {
            for spec in values_for_key(template, "spec") {
                for containers in values_for_key(spec, "containers") {
                    if !self.containers.matches(containers) {
                        continue;
                    }
                    for container in containers.elements() {
                        fields.extend(
                            values_for_key(container, "image")
                                .into_iter()
                                .filter(|image| self.image.matches(image)),
                        );
                    }
                }
            }
        }
        log::trace!("found {} container image fields", fields.len());
        fields
    }
}

impl<N: TreeNode + 'static> Default for PodTemplateQuery<N> {
    fn default() -> Self {
        PodTemplateQuery::new()
    }
}

/// Values stored under a string key, allowing for repeated keys
fn values_for_key<'a, N: TreeNode>(node: &'a N, key: &str) -> Vec<&'a N> {
    node.map_entries()
        .into_iter()
        .filter(|(k, _)| k.scalar_str() == Some(key))
        .map(|(_, v)| v)
        .collect()
}
