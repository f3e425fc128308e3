//! Rendered manifest parsing.
//!
//! A manifest is one or more YAML documents separated by `---`. Empty
//! documents are skipped; every remaining document must identify itself
//! with `apiVersion`, `kind` and `metadata.name`.

use kube::core::GroupVersionKind;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ManifestError;

/// One object to be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestObject {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub body: Value,
}

impl ManifestObject {
    pub fn gvk(&self) -> GroupVersionKind {
        let (group, version) = split_api_version(&self.api_version);
        GroupVersionKind::gvk(group, version, &self.kind)
    }

    /// Point the object at `namespace`, replacing whatever the template set.
    pub fn set_namespace(&mut self, namespace: &str) {
        if let Some(meta) = self.body.get_mut("metadata").and_then(Value::as_object_mut) {
            meta.insert("namespace".to_string(), Value::String(namespace.to_string()));
        }
    }
}

/// `apps/v1` → (`apps`, `v1`); core `v1` → (``, `v1`).
pub fn split_api_version(api_version: &str) -> (&str, &str) {
    match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

pub fn parse_documents(manifest: &[u8]) -> Result<Vec<ManifestObject>, ManifestError> {
    let mut objects = Vec::new();
    for (index, doc) in serde_yaml::Deserializer::from_slice(manifest).enumerate() {
        let body = Value::deserialize(doc).map_err(|source| ManifestError::Yaml { index, source })?;
        if body.is_null() {
            continue;
        }
        objects.push(parse_object(index, body)?);
    }
    Ok(objects)
}

fn parse_object(index: usize, body: Value) -> Result<ManifestObject, ManifestError> {
    if !body.is_object() {
        return Err(ManifestError::NotAnObject { index });
    }
    let field = |path: &[&str], name: &'static str| -> Result<String, ManifestError> {
        let mut cur = &body;
        for key in path {
            cur = cur
                .get(key)
                .ok_or(ManifestError::MissingField { index, field: name })?;
        }
        match cur.as_str() {
            Some(s) if !s.is_empty() => Ok(s.to_string()),
            _ => Err(ManifestError::MissingField { index, field: name }),
        }
    };
    let api_version = field(&["apiVersion"], "apiVersion")?;
    let kind = field(&["kind"], "kind")?;
    let name = field(&["metadata", "name"], "metadata.name")?;
    Ok(ManifestObject {
        api_version,
        kind,
        name,
        body,
    })
}
