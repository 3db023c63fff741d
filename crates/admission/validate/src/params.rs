//! Parameter resolution.
//!
//! A rule may bind to external "parameter" objects: one by name, or many by
//! label selector. Scoping rules:
//!
//! - namespace-scoped kind: look up in the reference's namespace override,
//!   else in the request's namespace; with neither, resolution fails.
//! - cluster-scoped kind: a namespace override is illegal.

use std::time::Duration;

use admission_types::{GroupVersion, ParamSpec, ParamTarget, Resource};
use tracing::debug;

use crate::error::ParamError;
use crate::interrupt::{guarded_call, CancelSignal};
use crate::traits::ResourceClient;

/// Resolves the ordered parameter set of a rule.
pub struct ParamResolver<'a> {
    client: Option<&'a dyn ResourceClient>,
    deadline: Duration,
}

impl<'a> ParamResolver<'a> {
    pub fn new(client: Option<&'a dyn ResourceClient>, deadline: Duration) -> Self {
        Self { client, deadline }
    }

    /// Collect the parameter objects for `spec`, for a request in
    /// `namespace` (empty for cluster-scoped requests).
    ///
    /// The result keeps store order. An empty result is only an error when
    /// the reference asks to deny on missing parameters.
    pub async fn collect(
        &self,
        spec: &ParamSpec,
        namespace: &str,
        cancel: &CancelSignal,
    ) -> Result<Vec<Resource>, ParamError> {
        let api_version = spec.kind.api_version.as_str();
        let kind = spec.kind.kind.as_str();
        let reference = &spec.reference;

        let gv = GroupVersion::parse(api_version)
            .map_err(|_| ParamError::MalformedApiVersion(api_version.to_string()))?;
        let client = self.client.ok_or(ParamError::NoClient)?;

        let namespaced = guarded_call(
            cancel,
            self.deadline,
            client.is_namespaced(&gv.group, &gv.version, kind),
        )
        .await
        .map_err(ParamError::ScopeCheck)?;

        let lookup_namespace = if namespaced {
            match reference.namespace_override() {
                Some(ns) => ns,
                None if namespace.is_empty() => {
                    return Err(ParamError::NamespacedParamForClusterScopedResource)
                }
                None => namespace,
            }
        } else {
            if let Some(ns) = reference.namespace_override() {
                return Err(ParamError::NamespaceOverrideOnClusterScoped {
                    namespace: ns.to_string(),
                });
            }
            ""
        };

        let params = match &reference.target {
            Some(ParamTarget::Name(name)) => {
                let param = guarded_call(
                    cancel,
                    self.deadline,
                    client.get_resource(api_version, kind, lookup_namespace, name),
                )
                .await
                .map_err(|source| ParamError::Fetch {
                    name: name.clone(),
                    source,
                })?;
                vec![param]
            }
            Some(ParamTarget::Selector(selector)) => guarded_call(
                cancel,
                self.deadline,
                client.list_resource(api_version, kind, lookup_namespace, selector),
            )
            .await
            .map_err(ParamError::List)?,
            None => Vec::new(),
        };

        debug!(
            param_kind = kind,
            namespace = lookup_namespace,
            param_count = params.len(),
            "resolved parameters"
        );

        if params.is_empty() && reference.denies_when_missing() {
            return Err(ParamError::NotFound);
        }

        Ok(params)
    }
}
