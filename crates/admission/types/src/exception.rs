//! Policy exceptions.
//!
//! An exception names the policy rules it waives and the resources it
//! applies to. Matching is a capability of the engine; the data lives here.

use serde::{Deserialize, Serialize};

/// Wildcard accepted in exception criteria.
pub const WILDCARD: &str = "*";

/// Rules of one policy that an exception waives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionEntry {
    /// `namespace/name` or `name` of the policy.
    pub policy_name: String,
    pub rule_names: Vec<String>,
}

/// Resources an exception applies to. Empty lists match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionCriteria {
    /// Kind names, optionally qualified as `group/version/Kind`.
    #[serde(default)]
    pub kinds: Vec<String>,
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
}

/// A policy exception.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyException {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub exceptions: Vec<ExceptionEntry>,
    #[serde(default, rename = "match")]
    pub criteria: ExceptionCriteria,
}

impl PolicyException {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn waive<I, S>(mut self, policy_name: impl Into<String>, rule_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exceptions.push(ExceptionEntry {
            policy_name: policy_name.into(),
            rule_names: rule_names.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn for_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.criteria.kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    pub fn for_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.criteria.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn for_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.criteria.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this exception waives `rule_name` of `policy_key`.
    pub fn waives(&self, policy_key: &str, rule_name: &str) -> bool {
        self.exceptions.iter().any(|entry| {
            entry.policy_name == policy_key
                && entry
                    .rule_names
                    .iter()
                    .any(|r| r == rule_name || r == WILDCARD)
        })
    }
}
