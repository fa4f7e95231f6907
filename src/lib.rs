//! Find and relocate the container images referenced by Kubernetes manifests
//!
//! The [image] module models Docker-style image references, including the
//! many ways the same image can be spelled, and the sorted [ImageSet] that
//! bundle configurations persist. The [manifest] module locates container
//! images inside arbitrarily nested pod templates, either to collect them or
//! to rewrite them in place without disturbing the rest of the document.

#[macro_use] extern crate lazy_static;

pub mod config;
pub mod errors;
pub mod image;
pub mod manifest;

pub use crate::{
    config::{BundleConfig, UserDefinedImage},
    image::{ImageName, ImageSet},
    manifest::{rewrite_images, scan_images, ImageMap},
};
