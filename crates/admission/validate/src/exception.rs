//! Exception resolution.
//!
//! Runs before anything else: a matching exception always takes precedence
//! over evaluating the rule.

use admission_types::{PolicyException, RequestContext, Rule, WILDCARD};
use tracing::{error, info};

use crate::error::ValidateError;
use crate::response::Verdict;
use crate::traits::ExceptionMatcher;

/// Matches exceptions by waived policy/rule and by their resource criteria
/// (kinds, namespaces, names). Criteria accept `*` and `?` wildcards.
#[derive(Debug, Clone, Copy, Default)]
pub struct CriteriaExceptionMatcher;

impl ExceptionMatcher for CriteriaExceptionMatcher {
    fn matches(&self, exception: &PolicyException, rule: &Rule, request: &RequestContext) -> bool {
        if !exception.waives(&request.policy.key(), &rule.name) {
            return false;
        }

        let criteria = &exception.criteria;
        let kind_ok = criteria.kinds.is_empty()
            || criteria.kinds.iter().any(|k| kind_matches(k, request));
        let namespace_ok = criteria.namespaces.is_empty()
            || criteria
                .namespaces
                .iter()
                .any(|ns| wildcard_match(ns, request.namespace()));
        let name_ok = criteria.names.is_empty()
            || criteria
                .names
                .iter()
                .any(|n| wildcard_match(n, request.name()));

        kind_ok && namespace_ok && name_ok
    }
}

/// `Kind`, `version/Kind` or `group/version/Kind`.
fn kind_matches(pattern: &str, request: &RequestContext) -> bool {
    let kind = &request.kind;
    let parts: Vec<&str> = pattern.split('/').collect();
    match parts.as_slice() {
        [k] => wildcard_match(k, &kind.kind),
        [v, k] => wildcard_match(v, &kind.version) && wildcard_match(k, &kind.kind),
        [g, v, k] => {
            wildcard_match(g, &kind.group)
                && wildcard_match(v, &kind.version)
                && wildcard_match(k, &kind.kind)
        }
        _ => false,
    }
}

/// Glob match supporting `*` (any run) and `?` (any single character).
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    if pattern == WILDCARD {
        return true;
    }

    let p: Vec<char> = pattern.chars().collect();
    let v: Vec<char> = value.chars().collect();
    let (mut pi, mut vi) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while vi < v.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == v[vi]) {
            pi += 1;
            vi += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, vi));
            pi += 1;
        } else if let Some((sp, sv)) = star {
            pi = sp + 1;
            vi = sv + 1;
            star = Some((sp, sv + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|c| *c == '*')
}

/// Stable identifying key of an exception: `namespace/name`, or `name`.
pub fn exception_key(exception: &PolicyException) -> Result<String, String> {
    if exception.name.is_empty() {
        return Err("object has no name".to_string());
    }
    if exception.namespace.is_empty() {
        Ok(exception.name.clone())
    } else {
        Ok(format!("{}/{}", exception.namespace, exception.name))
    }
}

/// Finds the first applicable exception and turns it into a verdict.
pub struct ExceptionResolver<'a> {
    matcher: &'a dyn ExceptionMatcher,
}

impl<'a> ExceptionResolver<'a> {
    pub fn new(matcher: &'a dyn ExceptionMatcher) -> Self {
        Self { matcher }
    }

    /// `None` when no exception applies and evaluation should proceed.
    pub fn resolve(
        &self,
        exceptions: &[PolicyException],
        rule: &Rule,
        request: &RequestContext,
    ) -> Option<Verdict> {
        let exception = exceptions
            .iter()
            .find(|e| self.matcher.matches(e, rule, request))?;

        match exception_key(exception) {
            Ok(key) => {
                info!(exception = %key, "policy rule skipped due to policy exception");
                Some(Verdict::skip_for_exception(&key, exception.clone()))
            }
            Err(reason) => {
                error!(
                    namespace = %exception.namespace,
                    name = %exception.name,
                    reason = %reason,
                    "failed to compute policy exception key"
                );
                Some(Verdict::error(
                    "failed to compute exception key",
                    ValidateError::ExceptionKey {
                        namespace: exception.namespace.clone(),
                        name: exception.name.clone(),
                        reason,
                    },
                ))
            }
        }
    }
}
