//! Admission request and owning policy descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gvk::{GroupVersionKind, GroupVersionResource};
use crate::resource::Resource;

/// Admission operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Connect,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Create => "CREATE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Connect => "CONNECT",
        };
        f.write_str(s)
    }
}

/// Identity of the requester.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl UserInfo {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }
}

/// Status of a native admission policy generated from a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionPolicyStatus {
    #[serde(default)]
    pub generated: bool,
    #[serde(default)]
    pub message: String,
}

/// Observed status of the owning policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatus {
    #[serde(default)]
    pub validating_admission_policy: AdmissionPolicyStatus,
}

/// The policy owning the rule under evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMeta {
    /// `ClusterPolicy` or `Policy`.
    pub kind: String,
    pub name: String,
    /// Empty for cluster-wide policies.
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub status: PolicyStatus,
}

impl PolicyMeta {
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            kind: "ClusterPolicy".into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: "Policy".into(),
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Mark that an equivalent native admission policy was generated.
    pub fn with_generated_admission_policy(mut self) -> Self {
        self.status.validating_admission_policy.generated = true;
        self
    }

    pub fn admission_policy_generated(&self) -> bool {
        self.status.validating_admission_policy.generated
    }

    /// `namespace/name`, or `name` for cluster-wide policies.
    pub fn key(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }
}

/// An incoming admission request. Immutable for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Absent on delete.
    #[serde(default)]
    pub object: Option<Resource>,
    /// Absent on create.
    #[serde(default)]
    pub old_object: Option<Resource>,
    pub kind: GroupVersionKind,
    pub resource: GroupVersionResource,
    pub operation: Operation,
    #[serde(default)]
    pub user_info: UserInfo,
    pub policy: PolicyMeta,
}

impl RequestContext {
    pub fn new(
        operation: Operation,
        kind: GroupVersionKind,
        resource: GroupVersionResource,
        policy: PolicyMeta,
    ) -> Self {
        Self {
            object: None,
            old_object: None,
            kind,
            resource,
            operation,
            user_info: UserInfo::default(),
            policy,
        }
    }

    pub fn with_object(mut self, object: Resource) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_old_object(mut self, old_object: Resource) -> Self {
        self.old_object = Some(old_object);
        self
    }

    pub fn with_user(mut self, user_info: UserInfo) -> Self {
        self.user_info = user_info;
        self
    }

    /// The object whose coordinates identify the request: the incoming
    /// object, or the prior object on delete.
    pub fn subject(&self) -> Option<&Resource> {
        self.object.as_ref().or(self.old_object.as_ref())
    }

    pub fn namespace(&self) -> &str {
        self.subject().map(Resource::namespace).unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.subject().map(Resource::name).unwrap_or_default()
    }
}
