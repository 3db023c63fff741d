//! Group/version/kind identifiers.
//!
//! Mirrors the API machinery naming used by the resource store: an
//! `apiVersion` string is either `version` (core group) or `group/version`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The core group's namespace kind, which never has itself as context.
pub const NAMESPACE_KIND: &str = "Namespace";

/// Failure parsing an `apiVersion` string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unexpected GroupVersion string: {0}")]
pub struct GroupVersionParseError(pub String);

/// An API group and version pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersion {
    pub group: String,
    pub version: String,
}

impl GroupVersion {
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    /// Parse an `apiVersion` string.
    ///
    /// `""` and `"/"` yield the empty group/version, `"v1"` yields the core
    /// group, `"apps/v1"` splits on the slash. More than one slash is an error.
    pub fn parse(api_version: &str) -> Result<Self, GroupVersionParseError> {
        if api_version.is_empty() || api_version == "/" {
            return Ok(Self::default());
        }

        match api_version.matches('/').count() {
            0 => Ok(Self::new("", api_version)),
            1 => {
                let (group, version) = api_version
                    .split_once('/')
                    .ok_or_else(|| GroupVersionParseError(api_version.to_string()))?;
                Ok(Self::new(group, version))
            }
            _ => Err(GroupVersionParseError(api_version.to_string())),
        }
    }

    /// Render back to `apiVersion` form.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn with_kind(&self, kind: impl Into<String>) -> GroupVersionKind {
        GroupVersionKind {
            group: self.group.clone(),
            version: self.version.clone(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.api_version())
    }
}

/// A fully-qualified kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// The built-in `v1/Namespace` kind.
    pub fn namespace() -> Self {
        Self::new("", "v1", NAMESPACE_KIND)
    }

    /// Whether this is exactly the core `v1/Namespace` kind.
    pub fn is_namespace(&self) -> bool {
        self.group.is_empty() && self.version == "v1" && self.kind == NAMESPACE_KIND
    }

    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::new(self.group.clone(), self.version.clone())
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Kind={}", self.group_version(), self.kind)
    }
}

/// A fully-qualified resource (plural REST name).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, Resource={}",
            GroupVersion::new(self.group.clone(), self.version.clone()),
            self.resource
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_core_version() {
        let gv = GroupVersion::parse("v1").unwrap();
        assert_eq!(gv.group, "");
        assert_eq!(gv.version, "v1");
    }

    #[test]
    fn parse_group_version() {
        let gv = GroupVersion::parse("rbac.authorization.k8s.io/v1").unwrap();
        assert_eq!(gv.group, "rbac.authorization.k8s.io");
        assert_eq!(gv.version, "v1");
    }

    #[test]
    fn parse_empty_and_bare_slash() {
        assert_eq!(GroupVersion::parse("").unwrap(), GroupVersion::default());
        assert_eq!(GroupVersion::parse("/").unwrap(), GroupVersion::default());
    }

    #[test]
    fn parse_rejects_extra_slashes() {
        let err = GroupVersion::parse("a/b/c").unwrap_err();
        assert!(err.to_string().contains("a/b/c"));
    }

    #[test]
    fn namespace_kind_detection() {
        assert!(GroupVersionKind::namespace().is_namespace());
        assert!(!GroupVersionKind::new("", "v1beta1", "Namespace").is_namespace());
        assert!(!GroupVersionKind::new("example.io", "v1", "Namespace").is_namespace());
        assert!(!GroupVersionKind::new("", "v1", "ConfigMap").is_namespace());
    }

    proptest! {
        #[test]
        fn api_version_renders_back(group in "[a-z]{0,8}(\\.[a-z]{2,4})?", version in "v[0-9]{1,2}") {
            let gv = GroupVersion::new(group, version);
            prop_assert_eq!(GroupVersion::parse(&gv.api_version()).unwrap(), gv);
        }
    }
}
