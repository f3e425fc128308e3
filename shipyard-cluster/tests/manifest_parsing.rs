//! Manifest parsing against the kind of output a resource template renders.

use shipyard_cluster::error::{is_already_exists, is_not_found};
use shipyard_cluster::{parse_documents, ClusterApiError, ManifestError};
use shipyard_core::ClusterError;

const RENDERED: &str = r#"# rendered for team luizalabs
apiVersion: v1
kind: ConfigMap
metadata:
  name: teresa-config
  labels:
    app: teresa
data:
  LOG_LEVEL: debug
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: teresa
spec:
  replicas: 3
  selector:
    matchLabels:
      app: teresa
  template:
    metadata:
      labels:
        app: teresa
    spec:
      containers:
        - name: teresa
          image: luizalabs/teresa:latest
---
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRole
metadata:
  name: teresa-reader
rules: []
"#;

#[test]
fn realistic_manifest_parses_in_order() {
    let objects = parse_documents(RENDERED.as_bytes()).expect("parse");
    let kinds: Vec<_> = objects.iter().map(|o| o.kind.as_str()).collect();
    assert_eq!(kinds, ["ConfigMap", "Deployment", "ClusterRole"]);
    assert_eq!(objects[1].body["spec"]["replicas"], 3);
    assert_eq!(objects[2].gvk().group, "rbac.authorization.k8s.io");
}

#[test]
fn comment_only_document_is_skipped() {
    let objects = parse_documents(b"# nothing here\n---\napiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n")
        .expect("parse");
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].name, "s");
}

#[test]
fn manifest_failure_is_not_a_conflict() {
    let err = parse_documents(b"kind: Secret\n").unwrap_err();
    assert!(matches!(err, ManifestError::MissingField { field: "apiVersion", .. }));

    let wrapped = ClusterError::new(ClusterApiError::from(err));
    assert!(!is_already_exists(&wrapped));
    assert!(!is_not_found(&wrapped));
    assert!(wrapped.to_string().contains("apiVersion"));
}
