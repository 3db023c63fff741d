//! Validation rules.
//!
//! A rule is a set of declarative boolean expressions plus the optional
//! parameter binding they may reference. The engine never interprets the
//! expression text; it hands it to the compiler collaborator.

use serde::{Deserialize, Serialize};

use crate::selector::LabelSelector;

/// One validation expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub expression: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub message_expression: Option<String>,
}

impl Validation {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_message_expression(mut self, expression: impl Into<String>) -> Self {
        self.message_expression = Some(expression.into());
        self
    }
}

/// Named expression bound as a variable for the other expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub expression: String,
}

/// Expression producing an audit annotation value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditAnnotation {
    pub key: String,
    pub value_expression: String,
}

/// Precondition gating whether the rule applies at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCondition {
    pub name: String,
    pub expression: String,
}

/// Kind of the parameter objects a rule may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamKind {
    pub api_version: String,
    pub kind: String,
}

impl ParamKind {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }
}

/// What to do when a parameter reference resolves to nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterNotFoundAction {
    #[default]
    Allow,
    Deny,
}

/// How parameter objects are located: one by name, or many by selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamTarget {
    Name(String),
    Selector(LabelSelector),
}

/// Reference to the parameter objects of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamRef {
    #[serde(default)]
    pub target: Option<ParamTarget>,
    /// Explicit lookup namespace; only legal for namespace-scoped kinds.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub parameter_not_found_action: Option<ParameterNotFoundAction>,
}

impl ParamRef {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            target: Some(ParamTarget::Name(name.into())),
            ..Self::default()
        }
    }

    pub fn by_selector(selector: LabelSelector) -> Self {
        Self {
            target: Some(ParamTarget::Selector(selector)),
            ..Self::default()
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn on_not_found(mut self, action: ParameterNotFoundAction) -> Self {
        self.parameter_not_found_action = Some(action);
        self
    }

    /// The namespace override, with an empty string treated as unset.
    pub fn namespace_override(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    /// Unset means allow.
    pub fn denies_when_missing(&self) -> bool {
        self.parameter_not_found_action == Some(ParameterNotFoundAction::Deny)
    }
}

/// Parameter binding: kind descriptor plus reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub kind: ParamKind,
    #[serde(default)]
    pub reference: ParamRef,
}

impl ParamSpec {
    pub fn new(kind: ParamKind, reference: ParamRef) -> Self {
        Self { kind, reference }
    }
}

/// Expression-based validation block of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CelValidation {
    /// Fallback message for validations that carry none of their own.
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub expressions: Vec<Validation>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub audit_annotations: Vec<AuditAnnotation>,
    #[serde(default)]
    pub param: Option<ParamSpec>,
}

/// A validation rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub name: String,
    #[serde(default)]
    pub preconditions: Vec<MatchCondition>,
    #[serde(default)]
    pub validation: CelValidation,
}

impl Rule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.validation.message = message.into();
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation.expressions.push(validation);
        self
    }

    pub fn with_precondition(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.preconditions.push(MatchCondition {
            name: name.into(),
            expression: expression.into(),
        });
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.validation.variables.push(Variable {
            name: name.into(),
            expression: expression.into(),
        });
        self
    }

    pub fn with_audit_annotation(
        mut self,
        key: impl Into<String>,
        value_expression: impl Into<String>,
    ) -> Self {
        self.validation.audit_annotations.push(AuditAnnotation {
            key: key.into(),
            value_expression: value_expression.into(),
        });
        self
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.validation.param = Some(param);
        self
    }

    pub fn has_param(&self) -> bool {
        self.validation.param.is_some()
    }

    /// Validations with the rule-level message filled in where missing.
    pub fn effective_validations(&self) -> Vec<Validation> {
        self.validation
            .expressions
            .iter()
            .cloned()
            .map(|mut v| {
                if v.message.is_empty() {
                    v.message = self.validation.message.clone();
                }
                v
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validations_inherit_rule_message() {
        let rule = Rule::new("check-replicas")
            .with_message("replicas must be at most 5")
            .with_validation(Validation::new("object.spec.replicas <= 5"))
            .with_validation(Validation::new("true").with_message("own message"));

        let validations = rule.effective_validations();
        assert_eq!(validations[0].message, "replicas must be at most 5");
        assert_eq!(validations[1].message, "own message");
        // The rule itself is untouched.
        assert!(rule.validation.expressions[0].message.is_empty());
    }

    #[test]
    fn not_found_action_defaults_to_allow() {
        let reference = ParamRef::by_name("limits");
        assert!(!reference.denies_when_missing());
        assert!(reference
            .on_not_found(ParameterNotFoundAction::Deny)
            .denies_when_missing());
    }

    #[test]
    fn empty_namespace_override_is_unset() {
        assert_eq!(ParamRef::by_name("x").in_namespace("").namespace_override(), None);
        assert_eq!(
            ParamRef::by_name("x").in_namespace("team").namespace_override(),
            Some("team")
        );
    }

    #[test]
    fn has_param_follows_binding() {
        let rule = Rule::new("r");
        assert!(!rule.has_param());
        let rule = rule.with_param(ParamSpec::new(
            ParamKind::new("v1", "ConfigMap"),
            ParamRef::default(),
        ));
        assert!(rule.has_param());
    }
}
