use kbundle::{
    errors::ManifestError,
    manifest::{ImageRewriter, ImageScanner, InvalidImagePolicy},
    rewrite_images, scan_images, BundleConfig, ImageMap, ImageName,
};

const DEPLOYMENT: &str = include_str!("testdata/deployment.yaml");
const DEPLOYMENT_SYNONYM: &str = include_str!("testdata/deployment-synonym.yaml");
const DEPLOYMENT_REPLACED: &str = include_str!("testdata/deployment-replaced.yaml");
const QUOTED: &str = include_str!("testdata/quoted.yaml");
const QUOTED_REPLACED: &str = include_str!("testdata/quoted-replaced.yaml");
const MULTIPLE: &str = include_str!("testdata/multiple.yaml");
const POD_JSON: &str = include_str!("testdata/pod.json");
const WIDGET: &str = include_str!("testdata/widget.yaml");
const BUNDLE_JSON: &str = include_str!("testdata/bundle.json");
const INVALID: &str = include_str!("testdata/invalid.yaml");

const CAINJECTOR: &str = "quay.io/jetstack/cert-manager-cainjector@sha256:9ff6923f6c567573103816796df283d03256bc7a9edb7450542e106b349cf34a";
const CAINJECTOR_RELOCATED: &str = "example.com/jetstack/cert-manager-cainjector@sha256:9ff6923f6c567573103816796df283d03256bc7a9edb7450542e106b349cf34a";

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn nginx_map() -> ImageMap {
    ImageMap::from_pairs(vec![("nginx:1.7.9", "example.com/nginx:1.7.9")]).unwrap()
}

#[test]
fn scan_deployment() {
    init();
    assert_eq!(
        scan_images(DEPLOYMENT).unwrap().strings(),
        vec!["docker.io/library/nginx:1.7.9"]
    );
    assert_eq!(
        scan_images(DEPLOYMENT_SYNONYM).unwrap(),
        scan_images(DEPLOYMENT).unwrap()
    );
}

#[test]
fn scan_multiple_documents() {
    init();
    assert_eq!(
        scan_images(MULTIPLE).unwrap().strings(),
        vec![
            "docker.io/bryanl/slim-hello-world:v1",
            "docker.io/envoyproxy/envoy:v1.14.1",
            "gcr.io/project/cleanup@sha256:5205844aefba7c91803198ef81da9134031f637d605d293dfe4531c622aa42b1",
        ]
    );
}

#[test]
fn scan_json_ignores_empty_images() {
    init();
    assert_eq!(
        scan_images(POD_JSON).unwrap().strings(),
        vec!["docker.io/library/busybox:1.32"]
    );
}

#[test]
fn scan_nothing() {
    init();
    assert!(scan_images("").unwrap().is_empty());
    assert!(scan_images("apiVersion: v1\nkind: ConfigMap\n").unwrap().is_empty());
    assert!(scan_images(WIDGET).unwrap().is_empty());
}

#[test]
fn scan_invalid_image() {
    init();
    match scan_images(INVALID) {
        Err(ManifestError::InvalidImage { document: 1, .. }) => {}
        other => panic!("unexpected result {:?}", other),
    }

    let skipping: ImageScanner = ImageScanner::new().invalid_images(InvalidImagePolicy::Skip);
    assert_eq!(
        skipping.scan_str(INVALID).unwrap().strings(),
        vec!["docker.io/library/nginx:latest"]
    );
}

#[test]
fn scan_decode_error() {
    init();
    let text = "kind: Pod\n---\nkind: [unclosed\n";
    match scan_images(text) {
        Err(ManifestError::Decode { document: 1, .. }) => {}
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn scan_user_defined_images() {
    init();
    let config = BundleConfig::from_json(BUNDLE_JSON).unwrap();
    let scanner: ImageScanner = ImageScanner::new()
        .user_defined_images(&config.user_defined_images)
        .unwrap();
    assert_eq!(
        scanner.scan_str(WIDGET).unwrap().strings(),
        vec!["docker.io/library/nginx:1.7.9", "docker.io/team/helper:v2"]
    );
    assert_eq!(
        scanner.scan_str(DEPLOYMENT).unwrap().strings(),
        vec!["docker.io/library/nginx:1.7.9"]
    );
}

#[test]
fn rewrite_deployment() {
    init();
    assert_eq!(
        rewrite_images(DEPLOYMENT, &nginx_map()).unwrap(),
        DEPLOYMENT_REPLACED
    );
}

#[test]
fn rewrite_synonym() {
    init();
    assert_eq!(
        rewrite_images(DEPLOYMENT_SYNONYM, &nginx_map()).unwrap(),
        DEPLOYMENT_REPLACED
    );
}

#[test]
fn rewrite_quoted_digest() {
    init();
    let map = ImageMap::from_pairs(vec![(CAINJECTOR, CAINJECTOR_RELOCATED)]).unwrap();
    assert_eq!(rewrite_images(QUOTED, &map).unwrap(), QUOTED_REPLACED);
}

#[test]
fn rewrite_pinned_tag_from_scanned_images() {
    init();
    let digest = "sha256:9ff6923f6c567573103816796df283d03256bc7a9edb7450542e106b349cf34a";
    let manifest = DEPLOYMENT.replace("nginx:1.7.9", &format!("nginx:1.7.9@{}", digest));
    let scanned = scan_images(&manifest).unwrap();
    assert_eq!(
        scanned.strings(),
        vec![format!("docker.io/library/nginx@{}", digest)]
    );

    let map: ImageMap = scanned
        .iter()
        .map(|old| {
            let canonical = old.canonical();
            let new = ImageName::from_parts(
                Some("example.com"),
                canonical.repository_str(),
                None,
                canonical.content_digest_str(),
            );
            (old.clone(), new.unwrap())
        })
        .collect();
    let relocated = format!("example.com/library/nginx@{}", digest);
    assert_eq!(
        rewrite_images(&manifest, &map).unwrap(),
        DEPLOYMENT_REPLACED.replace("example.com/nginx:1.7.9", &relocated)
    );
}

#[test]
fn rewrite_unrelated_is_identical() {
    init();
    let map = ImageMap::from_pairs(vec![("nginx:1.7.8", "example.com/nginx:1.7.8")]).unwrap();
    for text in &[DEPLOYMENT, QUOTED, MULTIPLE, POD_JSON, WIDGET] {
        assert_eq!(rewrite_images(text, &map).unwrap(), *text);
        assert_eq!(rewrite_images(text, &ImageMap::new()).unwrap(), *text);
    }
}

#[test]
fn rewrite_multiple_documents() {
    init();
    let map = ImageMap::from_pairs(vec![
        ("bryanl/slim-hello-world:v1", "registry.internal/hello:v1"),
        ("envoyproxy/envoy:v1.14.1", "registry.internal/envoy:v1.14.1"),
    ])
    .unwrap();
    let expected = MULTIPLE
        .replace(
            "image: bryanl/slim-hello-world:v1",
            "image: registry.internal/hello:v1",
        )
        .replace(
            "image: docker.io/bryanl/slim-hello-world:v1",
            "image: registry.internal/hello:v1",
        )
        .replace(
            "image: 'envoyproxy/envoy:v1.14.1'",
            "image: 'registry.internal/envoy:v1.14.1'",
        );
    let rewritten = rewrite_images(MULTIPLE, &map).unwrap();
    assert_eq!(rewritten, expected);
    assert_eq!(
        scan_images(&rewritten).unwrap().strings(),
        vec![
            "gcr.io/project/cleanup@sha256:5205844aefba7c91803198ef81da9134031f637d605d293dfe4531c622aa42b1",
            "registry.internal/envoy:v1.14.1",
            "registry.internal/hello:v1",
        ]
    );
}

#[test]
fn rewrite_json() {
    init();
    let map = ImageMap::from_pairs(vec![("busybox:1.32", "example.com/busybox:1.32")]).unwrap();
    let rewritten = rewrite_images(POD_JSON, &map).unwrap();
    assert_eq!(
        rewritten,
        POD_JSON.replace("\"busybox:1.32\"", "\"example.com/busybox:1.32\"")
    );
    let value: serde_json::Value = serde_json::from_str(&rewritten).unwrap();
    assert_eq!(value["spec"]["containers"][0]["image"], "example.com/busybox:1.32");
}

#[test]
fn rewrite_user_defined_images() {
    init();
    let config = BundleConfig::from_json(BUNDLE_JSON).unwrap();
    let rewriter = ImageRewriter::new()
        .user_defined_images(&config.user_defined_images)
        .unwrap();
    let map = ImageMap::from_pairs(vec![
        ("nginx:1.7.9", "example.com/nginx:1.7.9"),
        ("team/helper:v2", "example.com/helper:v2"),
        ("not/scanned:v1", "example.com/scanned:v1"),
    ])
    .unwrap();
    let expected = WIDGET
        .replace("ref: nginx:1.7.9", "ref: example.com/nginx:1.7.9")
        .replace("ref: \"team/helper:v2\"", "ref: \"example.com/helper:v2\"");
    assert_eq!(rewriter.rewrite(WIDGET, &map).unwrap(), expected);
}

#[test]
fn rewrite_syntax_error() {
    init();
    match rewrite_images("kind: Pod\n---\nkind: [unclosed\n", &nginx_map()) {
        Err(ManifestError::Syntax { document: 1, .. }) => {}
        other => panic!("unexpected result {:?}", other),
    }
}
