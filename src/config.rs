//! Bundle configuration model
//!
//! This is the in-memory form of a bundle's configuration document, with the
//! operations that keep it normalized. Reading and writing the file itself is
//! left to the caller.

use crate::{
    errors::{ConfigError, ImageError},
    image::ImageSet,
};
use serde::{Deserialize, Serialize};

/// How the value found at a user-defined image path is interpreted
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageResultType {
    /// The path leads to image strings
    Single,
    /// The path may also lead to lists of image strings
    Multiple,
}

impl Default for ImageResultType {
    fn default() -> Self {
        ImageResultType::Single
    }
}

/// Where to find images in a resource that isn't shaped like a pod template
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDefinedImage {
    pub api_version: String,
    pub kind: String,
    pub json_path: String,
    #[serde(rename = "type", default)]
    pub result_type: ImageResultType,
}

impl UserDefinedImage {
    fn key(&self) -> (&str, &str) {
        (&self.api_version, &self.kind)
    }
}

/// Configuration stored alongside a bundle's manifests
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleConfig {
    #[serde(default)]
    pub schema_version: String,
    pub name: String,
    pub version: String,

    /// `None` means no images were ever configured, which is not the same as
    /// an empty list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<ImageSet>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_defined_images: Vec<UserDefinedImage>,
}

impl BundleConfig {
    pub fn new(name: &str, version: &str) -> Self {
        BundleConfig {
            schema_version: "v1alpha1".to_owned(),
            name: name.to_owned(),
            version: version.to_owned(),
            ..BundleConfig::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Union more images into the configured set
    ///
    /// Adding nothing to a configuration with no images leaves it unset.
    pub fn add_images<I, S>(&mut self, references: I) -> Result<(), ImageError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let added = ImageSet::new(references)?;
        self.images = match (self.images.take(), added.is_empty()) {
            (None, true) => None,
            (None, false) => Some(added),
            (Some(existing), _) => Some(existing.union(&added)),
        };
        Ok(())
    }

    /// Add a user-defined image rule, replacing any rule for the same
    /// `apiVersion` and `kind`
    pub fn set_user_defined_image(&mut self, rule: UserDefinedImage) {
        self.user_defined_images.retain(|existing| existing.key() != rule.key());
        self.user_defined_images.push(rule);
        self.user_defined_images.sort_by(|a, b| a.key().cmp(&b.key()));
    }

    /// Remove the rule for this `apiVersion` and `kind`, if there is one
    pub fn delete_user_defined_image(&mut self, api_version: &str, kind: &str) -> bool {
        let before = self.user_defined_images.len();
        self.user_defined_images.retain(|existing| existing.key() != (api_version, kind));
        self.user_defined_images.len() != before
    }
}

#[cfg(test)]
mod tests;
