//! Rule verdicts and responses.

use std::fmt;
use std::time::Duration;

use admission_types::PolicyException;
use chrono::{DateTime, Utc};

use crate::error::ValidateError;

/// Skip message when a result signals unmet preconditions.
pub const PRECONDITIONS_NOT_MET: &str = "cel preconditions not met";

/// Status tag of a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleStatus {
    Pass,
    Fail,
    Skip,
    Error,
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleStatus::Pass => "pass",
            RuleStatus::Fail => "fail",
            RuleStatus::Skip => "skip",
            RuleStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// The single final outcome of a rule evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass {
        message: String,
    },
    /// The policy denied the request.
    Fail {
        message: String,
    },
    Skip {
        message: String,
        /// Set when an exception caused the skip.
        exception: Option<PolicyException>,
    },
    /// The policy could not be evaluated.
    Error {
        message: String,
        cause: Option<ValidateError>,
    },
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Verdict::Pass {
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Verdict::Fail {
            message: message.into(),
        }
    }

    pub fn skip(message: impl Into<String>) -> Self {
        Verdict::Skip {
            message: message.into(),
            exception: None,
        }
    }

    pub fn skip_for_exception(key: &str, exception: PolicyException) -> Self {
        Verdict::Skip {
            message: format!("rule skipped due to policy exception {}", key),
            exception: Some(exception),
        }
    }

    pub fn error(message: impl Into<String>, cause: ValidateError) -> Self {
        Verdict::Error {
            message: message.into(),
            cause: Some(cause),
        }
    }

    /// An error reported by the evaluator itself, without a local cause.
    pub fn eval_error(message: impl Into<String>) -> Self {
        Verdict::Error {
            message: message.into(),
            cause: None,
        }
    }

    pub fn status(&self) -> RuleStatus {
        match self {
            Verdict::Pass { .. } => RuleStatus::Pass,
            Verdict::Fail { .. } => RuleStatus::Fail,
            Verdict::Skip { .. } => RuleStatus::Skip,
            Verdict::Error { .. } => RuleStatus::Error,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Verdict::Pass { message }
            | Verdict::Fail { message }
            | Verdict::Skip { message, .. }
            | Verdict::Error { message, .. } => message,
        }
    }

    pub fn exception(&self) -> Option<&PolicyException> {
        match self {
            Verdict::Skip { exception, .. } => exception.as_ref(),
            _ => None,
        }
    }

    pub fn cause(&self) -> Option<&ValidateError> {
        match self {
            Verdict::Error { cause, .. } => cause.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cause() {
            Some(cause) => write!(f, "{}: {}: {}", self.status(), self.message(), cause),
            None => write!(f, "{}: {}", self.status(), self.message()),
        }
    }
}

/// Verdict of one rule plus bookkeeping.
#[derive(Debug, Clone)]
pub struct RuleResponse {
    pub rule_name: String,
    pub verdict: Verdict,
    pub timestamp: DateTime<Utc>,
    pub processing_time: Duration,
}

impl RuleResponse {
    pub fn new(rule_name: impl Into<String>, verdict: Verdict, processing_time: Duration) -> Self {
        Self {
            rule_name: rule_name.into(),
            verdict,
            timestamp: Utc::now(),
            processing_time,
        }
    }

    pub fn status(&self) -> RuleStatus {
        self.verdict.status()
    }

    pub fn message(&self) -> &str {
        self.verdict.message()
    }
}
