//! Unstructured resources.
//!
//! Objects flow through the engine as opaque JSON documents; only the
//! `apiVersion`, `kind` and `metadata` coordinates are interpreted here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::gvk::{GroupVersion, GroupVersionKind, NAMESPACE_KIND};

/// An unstructured resource document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(Map<String, Value>);

impl Resource {
    /// Wrap a JSON value. Returns `None` unless the value is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Build a minimal resource with just its coordinates.
    pub fn new(api_version: &str, kind: &str, namespace: &str, name: &str) -> Self {
        let mut metadata = Map::new();
        metadata.insert("name".into(), Value::String(name.into()));
        if !namespace.is_empty() {
            metadata.insert("namespace".into(), Value::String(namespace.into()));
        }

        let mut map = Map::new();
        map.insert("apiVersion".into(), Value::String(api_version.into()));
        map.insert("kind".into(), Value::String(kind.into()));
        map.insert("metadata".into(), Value::Object(metadata));
        Self(map)
    }

    /// A minimal `v1/Namespace` object used when no fetched namespace is
    /// available. An empty name is the stable placeholder.
    pub fn namespace_placeholder(name: &str) -> Self {
        Self::new("v1", NAMESPACE_KIND, "", name)
    }

    pub fn with_labels<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let labels: Map<String, Value> = labels
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        let mut metadata = self.take_metadata();
        metadata.insert("labels".into(), Value::Object(labels));
        self.0.insert("metadata".into(), Value::Object(metadata));
        self
    }

    /// Set a top-level field, e.g. `spec` or `data`.
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn api_version(&self) -> &str {
        self.0
            .get("apiVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn kind(&self) -> &str {
        self.0.get("kind").and_then(Value::as_str).unwrap_or_default()
    }

    /// Group/version/kind as declared by the document itself.
    ///
    /// A malformed `apiVersion` yields `None`.
    pub fn group_version_kind(&self) -> Option<GroupVersionKind> {
        GroupVersion::parse(self.api_version())
            .ok()
            .map(|gv| gv.with_kind(self.kind()))
    }

    pub fn name(&self) -> &str {
        self.metadata_str("name")
    }

    pub fn namespace(&self) -> &str {
        self.metadata_str("namespace")
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        self.metadata()
            .and_then(|m| m.get("labels"))
            .and_then(Value::as_object)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    fn metadata(&self) -> Option<&Map<String, Value>> {
        self.0.get("metadata").and_then(Value::as_object)
    }

    fn metadata_str(&self, key: &str) -> &str {
        self.metadata()
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    fn take_metadata(&mut self) -> Map<String, Value> {
        match self.0.remove("metadata") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl From<Map<String, Value>> for Resource {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
