//! Evaluator outcomes.
//!
//! One evaluator invocation produces an [`EvaluationResult`]: either the
//! empty sentinel (preconditions unmet) or a set of [`Decision`]s, one per
//! validation expression.

use serde::{Deserialize, Serialize};

/// What the evaluator recommends for one expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionAction {
    Admit,
    Deny,
}

/// Whether the expression evaluated cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvaluationOutcome {
    Success,
    Error,
}

/// One evaluator-produced outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: DecisionAction,
    pub evaluation: EvaluationOutcome,
    #[serde(default)]
    pub message: String,
}

impl Decision {
    pub fn admit() -> Self {
        Self {
            action: DecisionAction::Admit,
            evaluation: EvaluationOutcome::Success,
            message: String::new(),
        }
    }

    pub fn deny(message: impl Into<String>) -> Self {
        Self {
            action: DecisionAction::Deny,
            evaluation: EvaluationOutcome::Success,
            message: message.into(),
        }
    }

    /// The expression could not be evaluated.
    pub fn eval_error(message: impl Into<String>) -> Self {
        Self {
            action: DecisionAction::Admit,
            evaluation: EvaluationOutcome::Error,
            message: message.into(),
        }
    }

    pub fn is_deny(&self) -> bool {
        self.action == DecisionAction::Deny
    }

    pub fn is_eval_error(&self) -> bool {
        self.action == DecisionAction::Admit && self.evaluation == EvaluationOutcome::Error
    }
}

/// Value produced by an audit-annotation expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditAnnotationValue {
    pub key: String,
    pub value: String,
}

/// Result of one evaluator invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    #[serde(default)]
    pub decisions: Vec<Decision>,
    #[serde(default)]
    pub audit_annotations: Vec<AuditAnnotationValue>,
}

impl EvaluationResult {
    /// The sentinel for "preconditions not satisfied".
    pub fn preconditions_unmet() -> Self {
        Self::default()
    }

    pub fn from_decisions(decisions: Vec<Decision>) -> Self {
        Self {
            decisions,
            audit_annotations: Vec::new(),
        }
    }

    pub fn with_audit_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.audit_annotations.push(AuditAnnotationValue {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// True only for the sentinel: no decisions and no annotations.
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty() && self.audit_annotations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_empty() {
        assert!(EvaluationResult::preconditions_unmet().is_empty());
        assert!(!EvaluationResult::from_decisions(vec![Decision::admit()]).is_empty());
    }

    #[test]
    fn annotations_alone_are_not_the_sentinel() {
        let result = EvaluationResult::default().with_audit_annotation("k", "v");
        assert!(!result.is_empty());
    }

    #[test]
    fn decision_classification() {
        assert!(Decision::deny("no").is_deny());
        assert!(Decision::eval_error("boom").is_eval_error());
        assert!(!Decision::admit().is_eval_error());
        let deny_with_error = Decision {
            action: DecisionAction::Deny,
            evaluation: EvaluationOutcome::Error,
            message: String::new(),
        };
        assert!(deny_with_error.is_deny());
        assert!(!deny_with_error.is_eval_error());
    }
}
