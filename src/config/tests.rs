use super::*;

fn rule(api_version: &str, kind: &str, json_path: &str) -> UserDefinedImage {
    UserDefinedImage {
        api_version: api_version.to_owned(),
        kind: kind.to_owned(),
        json_path: json_path.to_owned(),
        result_type: ImageResultType::Single,
    }
}

#[test]
fn unset_images_are_omitted() {
    let config = BundleConfig::new("app", "0.1.0");
    assert_eq!(config.images, None);
    let json = config.to_json().unwrap();
    assert!(!json.contains("images"));
    assert_eq!(BundleConfig::from_json(&json).unwrap(), config);
}

#[test]
fn empty_images_are_kept() {
    let mut config = BundleConfig::new("app", "0.1.0");
    config.images = Some(ImageSet::empty());
    let value: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
    assert_eq!(value["images"], serde_json::json!([]));
    assert_eq!(
        BundleConfig::from_json(&config.to_json().unwrap())
            .unwrap()
            .images,
        Some(ImageSet::empty())
    );
}

#[test]
fn add_images() {
    let mut config = BundleConfig::new("app", "0.1.0");
    config.add_images(Vec::<String>::new()).unwrap();
    assert_eq!(config.images, None);

    config.add_images(&["nginx:1.7.9", "busybox"]).unwrap();
    config.add_images(&["docker.io/library/nginx:1.7.9"]).unwrap();
    assert_eq!(
        config.images.as_ref().unwrap().strings(),
        vec![
            "docker.io/library/busybox:latest",
            "docker.io/library/nginx:1.7.9",
        ]
    );

    assert!(config.add_images(&["x@bad"]).is_err());
    assert_eq!(config.images.as_ref().unwrap().len(), 2);
}

#[test]
fn json_field_names() {
    let mut config = BundleConfig::new("app", "0.1.0");
    config.add_images(&["nginx"]).unwrap();
    config.set_user_defined_image(UserDefinedImage {
        result_type: ImageResultType::Multiple,
        ..rule("example.com/v1", "Widget", "{.spec.images}")
    });
    let value: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "schemaVersion": "v1alpha1",
            "name": "app",
            "version": "0.1.0",
            "images": ["docker.io/library/nginx:latest"],
            "userDefinedImages": [{
                "apiVersion": "example.com/v1",
                "kind": "Widget",
                "jsonPath": "{.spec.images}",
                "type": "multiple",
            }],
        })
    );
}

#[test]
fn rule_type_defaults_to_single() {
    let parsed: UserDefinedImage = serde_json::from_str(
        r#"{"apiVersion": "example.com/v1", "kind": "Widget", "jsonPath": "{.spec.image}"}"#,
    )
    .unwrap();
    assert_eq!(parsed.result_type, ImageResultType::Single);
}

#[test]
fn invalid_images_in_json() {
    assert!(BundleConfig::from_json(
        r#"{"name": "app", "version": "1", "images": ["x@bad"]}"#
    )
    .is_err());
}

#[test]
fn user_defined_images_sorted_and_replaced() {
    let mut config = BundleConfig::new("app", "0.1.0");
    config.set_user_defined_image(rule("b/v1", "Widget", "{.a}"));
    config.set_user_defined_image(rule("a/v1", "Widget", "{.b}"));
    config.set_user_defined_image(rule("a/v1", "Gadget", "{.c}"));
    config.set_user_defined_image(rule("b/v1", "Widget", "{.d}"));

    let keys: Vec<_> = config
        .user_defined_images
        .iter()
        .map(|r| (r.api_version.as_str(), r.kind.as_str(), r.json_path.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("a/v1", "Gadget", "{.c}"),
            ("a/v1", "Widget", "{.b}"),
            ("b/v1", "Widget", "{.d}"),
        ]
    );

    assert!(config.delete_user_defined_image("a/v1", "Widget"));
    assert!(!config.delete_user_defined_image("a/v1", "Widget"));
    assert!(config.delete_user_defined_image("a/v1", "Gadget"));
    assert!(config.delete_user_defined_image("b/v1", "Widget"));
    assert!(config.user_defined_images.is_empty());
    assert!(!config.to_json().unwrap().contains("userDefinedImages"));
}
