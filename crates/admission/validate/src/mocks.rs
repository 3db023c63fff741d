//! In-memory fakes for the engine's collaborators.
//!
//! Used by this crate's tests and by downstream crates that want to drive
//! the handler without a live resource store or expression engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use admission_types::{
    Decision, EvaluationResult, GroupVersion, LabelSelector, Resource, NAMESPACE_KIND,
};
use async_trait::async_trait;

use crate::attributes::{CompileRequest, EvaluationContext};
use crate::error::{ClientError, CompileError};
use crate::traits::{ExpressionCompiler, ResourceClient, Validator};

/// Resource store backed by vectors, kept in insertion order.
#[derive(Default)]
pub struct InMemoryResourceClient {
    namespaces: Vec<Resource>,
    resources: Vec<Resource>,
    scopes: HashMap<(String, String), bool>,
    latency: Option<Duration>,
    namespace_failure: Option<ClientError>,
    get_failure: Option<ClientError>,
    list_failure: Option<ClientError>,
    namespace_fetches: AtomicUsize,
    resource_fetches: AtomicUsize,
    resource_lists: AtomicUsize,
    scope_checks: AtomicUsize,
}

impl InMemoryResourceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: Resource) -> Self {
        self.namespaces.push(namespace);
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Register whether `kind` in `api_version` is namespace-scoped. Scope
    /// checks for unregistered kinds fail.
    pub fn with_scope(mut self, api_version: &str, kind: &str, namespaced: bool) -> Self {
        self.scopes
            .insert((api_version.to_string(), kind.to_string()), namespaced);
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn fail_namespaces(mut self, error: ClientError) -> Self {
        self.namespace_failure = Some(error);
        self
    }

    pub fn fail_gets(mut self, error: ClientError) -> Self {
        self.get_failure = Some(error);
        self
    }

    pub fn fail_lists(mut self, error: ClientError) -> Self {
        self.list_failure = Some(error);
        self
    }

    pub fn namespace_fetches(&self) -> usize {
        self.namespace_fetches.load(Ordering::SeqCst)
    }

    pub fn resource_fetches(&self) -> usize {
        self.resource_fetches.load(Ordering::SeqCst)
    }

    pub fn resource_lists(&self) -> usize {
        self.resource_lists.load(Ordering::SeqCst)
    }

    pub fn scope_checks(&self) -> usize {
        self.scope_checks.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn selects(resource: &Resource, api_version: &str, kind: &str, namespace: &str) -> bool {
        resource.api_version() == api_version
            && resource.kind() == kind
            && (namespace.is_empty() || resource.namespace() == namespace)
    }
}

#[async_trait]
impl ResourceClient for InMemoryResourceClient {
    async fn get_namespace(&self, name: &str) -> Result<Resource, ClientError> {
        self.namespace_fetches.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if let Some(err) = &self.namespace_failure {
            return Err(err.clone());
        }
        self.namespaces
            .iter()
            .find(|ns| ns.name() == name)
            .cloned()
            .ok_or_else(|| ClientError::NotFound {
                kind: NAMESPACE_KIND.to_string(),
                name: name.to_string(),
            })
    }

    async fn get_resource(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Resource, ClientError> {
        self.resource_fetches.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if let Some(err) = &self.get_failure {
            return Err(err.clone());
        }
        self.resources
            .iter()
            .find(|r| {
                r.api_version() == api_version
                    && r.kind() == kind
                    && r.namespace() == namespace
                    && r.name() == name
            })
            .cloned()
            .ok_or_else(|| ClientError::NotFound {
                kind: kind.to_string(),
                name: name.to_string(),
            })
    }

    async fn list_resource(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<Resource>, ClientError> {
        self.resource_lists.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if let Some(err) = &self.list_failure {
            return Err(err.clone());
        }
        Ok(self
            .resources
            .iter()
            .filter(|r| Self::selects(r, api_version, kind, namespace))
            .filter(|r| selector.matches(&r.labels()))
            .cloned()
            .collect())
    }

    async fn is_namespaced(
        &self,
        group: &str,
        version: &str,
        kind: &str,
    ) -> Result<bool, ClientError> {
        self.scope_checks.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        let api_version = GroupVersion::new(group, version).api_version();
        self.scopes
            .get(&(api_version.clone(), kind.to_string()))
            .copied()
            .ok_or_else(|| {
                ClientError::Other(format!("no resource mapping for {}, Kind={}", api_version, kind))
            })
    }
}

/// What a [`ScriptedValidator`] saw on one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Name of the parameter object, if one was bound.
    pub param: Option<String>,
    pub namespace: String,
    pub object_name: String,
    pub cost_budget: u64,
}

/// Validator returning scripted results.
///
/// The n-th invocation returns the n-th scripted result; once the script
/// runs out, results for the bound parameter's name are used, then the
/// fallback.
pub struct ScriptedValidator {
    script: Vec<EvaluationResult>,
    by_param: HashMap<String, EvaluationResult>,
    fallback: EvaluationResult,
    latency: Option<Duration>,
    invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedValidator {
    pub fn new(fallback: EvaluationResult) -> Self {
        Self {
            script: Vec::new(),
            by_param: HashMap::new(),
            fallback,
            latency: None,
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Admits every invocation.
    pub fn admit_all() -> Self {
        Self::new(EvaluationResult::from_decisions(vec![Decision::admit()]))
    }

    /// Denies every invocation with `message`.
    pub fn deny_all(message: &str) -> Self {
        Self::new(EvaluationResult::from_decisions(vec![Decision::deny(message)]))
    }

    /// Reports unmet preconditions on every invocation.
    pub fn preconditions_unmet() -> Self {
        Self::new(EvaluationResult::preconditions_unmet())
    }

    /// Append a result for the next unscripted invocation.
    pub fn then(mut self, result: EvaluationResult) -> Self {
        self.script.push(result);
        self
    }

    /// Result for invocations bound to the parameter named `name`.
    pub fn on_param(mut self, name: impl Into<String>, result: EvaluationResult) -> Self {
        self.by_param.insert(name.into(), result);
        self
    }

    /// Delay every invocation by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Validator for ScriptedValidator {
    async fn validate(&self, context: EvaluationContext<'_>) -> EvaluationResult {
        let param = context.param.map(|p| p.name().to_string());
        let index = {
            let mut invocations = self
                .invocations
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            invocations.push(Invocation {
                param: param.clone(),
                namespace: context.namespace.name().to_string(),
                object_name: context.attributes.name.clone(),
                cost_budget: context.cost_budget,
            });
            invocations.len() - 1
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(result) = self.script.get(index) {
            return result.clone();
        }
        param
            .and_then(|name| self.by_param.get(&name).cloned())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Compiler handing out a fixed validator, or failing.
pub struct ScriptedCompiler {
    validator: Option<Arc<dyn Validator>>,
    failure: String,
    requests: Mutex<Vec<CompileRequest>>,
}

impl ScriptedCompiler {
    pub fn new(validator: Arc<dyn Validator>) -> Self {
        Self {
            validator: Some(validator),
            failure: String::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A compiler that rejects every rule with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            validator: None,
            failure: message.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompileRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn compilations(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ExpressionCompiler for ScriptedCompiler {
    fn compile(&self, request: CompileRequest) -> Result<Arc<dyn Validator>, CompileError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        self.validator
            .clone()
            .ok_or_else(|| CompileError(self.failure.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Authorizer, VersionedAttributes};
    use admission_types::{
        GroupVersionKind, GroupVersionResource, Operation, PolicyMeta, RequestContext, Rule,
    };

    fn attributes() -> VersionedAttributes {
        let request = RequestContext::new(
            Operation::Create,
            GroupVersionKind::new("", "v1", "Pod"),
            GroupVersionResource::new("", "v1", "pods"),
            PolicyMeta::cluster("p"),
        )
        .with_object(Resource::new("v1", "Pod", "team-a", "web"));
        VersionedAttributes::build(&request, "team-a").unwrap()
    }

    #[tokio::test]
    async fn client_filters_by_namespace_and_selector() {
        let client = InMemoryResourceClient::new()
            .with_resource(Resource::new("v1", "ConfigMap", "a", "one").with_labels([("k", "v")]))
            .with_resource(Resource::new("v1", "ConfigMap", "b", "two").with_labels([("k", "v")]))
            .with_resource(Resource::new("v1", "ConfigMap", "a", "three"));

        let selector = LabelSelector::default().with_label("k", "v");
        let in_a = client.list_resource("v1", "ConfigMap", "a", &selector).await.unwrap();
        assert_eq!(in_a.len(), 1);

        let all = client.list_resource("v1", "ConfigMap", "", &selector).await.unwrap();
        let names: Vec<_> = all.iter().map(Resource::name).collect();
        assert_eq!(names, vec!["one", "two"]);
        assert_eq!(client.resource_lists(), 2);
    }

    #[tokio::test]
    async fn client_scope_lookup_uses_core_group() {
        let client = InMemoryResourceClient::new().with_scope("v1", "ConfigMap", true);
        assert!(client.is_namespaced("", "v1", "ConfigMap").await.unwrap());
        assert!(client.is_namespaced("", "v1", "Secret").await.is_err());
        assert_eq!(client.scope_checks(), 2);
    }

    #[tokio::test]
    async fn client_injected_failures() {
        let client = InMemoryResourceClient::new()
            .with_namespace(Resource::namespace_placeholder("a"))
            .fail_namespaces(ClientError::Unavailable("down".into()));
        assert_eq!(
            client.get_namespace("a").await,
            Err(ClientError::Unavailable("down".into()))
        );
    }

    #[tokio::test]
    async fn validator_follows_script_then_params_then_fallback() {
        let validator = ScriptedValidator::admit_all()
            .then(EvaluationResult::preconditions_unmet())
            .on_param("p2", EvaluationResult::from_decisions(vec![Decision::deny("no")]));

        let attributes = attributes();
        let namespace = Resource::namespace_placeholder("team-a");
        let authorizer = Authorizer::new(None, GroupVersionKind::new("", "v1", "Pod"));
        let p1 = Resource::new("v1", "ConfigMap", "team-a", "p1");
        let p2 = Resource::new("v1", "ConfigMap", "team-a", "p2");
        let context = |param| EvaluationContext {
            attributes: &attributes,
            param,
            namespace: &namespace,
            cost_budget: 5,
            authorizer: &authorizer,
        };

        assert!(validator.validate(context(Some(&p1))).await.is_empty());
        assert!(validator.validate(context(Some(&p2))).await.decisions[0].is_deny());
        assert!(!validator.validate(context(Some(&p1))).await.decisions[0].is_deny());

        let seen = validator.invocations();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].param.as_deref(), Some("p2"));
        assert_eq!(seen[0].namespace, "team-a");
        assert_eq!(seen[0].object_name, "web");
        assert_eq!(seen[0].cost_budget, 5);
    }

    #[test]
    fn compiler_records_requests() {
        let compiler = ScriptedCompiler::failing("bad expression");
        let request = CompileRequest::for_rule(&Rule::new("r"));
        let err = compiler.compile(request).err().unwrap();
        assert_eq!(err, CompileError("bad expression".into()));
        assert_eq!(compiler.compilations(), 1);

        let compiler = ScriptedCompiler::new(Arc::new(ScriptedValidator::admit_all()));
        assert!(compiler.compile(CompileRequest::for_rule(&Rule::new("r"))).is_ok());
    }
}
