//! Namespace context resolution.

use std::time::Duration;

use admission_types::{GroupVersionKind, Resource};
use tracing::debug;

use crate::error::{Result, ValidateError};
use crate::interrupt::{guarded_call, CancelSignal};
use crate::traits::ResourceClient;

/// The namespace a request is evaluated in.
///
/// A namespace object is its own namespace, so it never gets one as context.
pub fn effective_namespace<'a>(namespace: &'a str, kind: &GroupVersionKind) -> &'a str {
    if kind.is_namespace() {
        ""
    } else {
        namespace
    }
}

/// Resolves the namespace object handed to the evaluator.
pub struct NamespaceResolver<'a> {
    client: Option<&'a dyn ResourceClient>,
    deadline: Duration,
}

impl<'a> NamespaceResolver<'a> {
    pub fn new(client: Option<&'a dyn ResourceClient>, deadline: Duration) -> Self {
        Self { client, deadline }
    }

    /// Fetch the namespace named `namespace` for a request of `kind`.
    ///
    /// An empty (or forced-empty) name yields the empty-name placeholder.
    /// Without a client the namespace is synthesized from its name.
    pub async fn resolve(
        &self,
        namespace: &str,
        kind: &GroupVersionKind,
        cancel: &CancelSignal,
    ) -> Result<Resource> {
        let namespace = effective_namespace(namespace, kind);
        if namespace.is_empty() {
            return Ok(Resource::namespace_placeholder(""));
        }

        let Some(client) = self.client else {
            debug!(namespace, "no resource client, synthesizing namespace");
            return Ok(Resource::namespace_placeholder(namespace));
        };

        guarded_call(cancel, self.deadline, client.get_namespace(namespace))
            .await
            .map_err(|source| ValidateError::NamespaceFetch {
                namespace: namespace.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::mocks::InMemoryResourceClient;

    const DEADLINE: Duration = Duration::from_secs(5);

    fn pod() -> GroupVersionKind {
        GroupVersionKind::new("", "v1", "Pod")
    }

    #[test]
    fn namespace_kind_forces_empty() {
        assert_eq!(effective_namespace("kube-system", &GroupVersionKind::namespace()), "");
        assert_eq!(effective_namespace("kube-system", &pod()), "kube-system");
    }

    #[tokio::test]
    async fn fetches_named_namespace() {
        let client = InMemoryResourceClient::new().with_namespace(
            Resource::namespace_placeholder("team-a").with_labels([("env", "prod")]),
        );
        let resolver = NamespaceResolver::new(Some(&client), DEADLINE);

        let ns = resolver
            .resolve("team-a", &pod(), &CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(ns.name(), "team-a");
        assert_eq!(ns.labels().get("env").map(String::as_str), Some("prod"));
        assert_eq!(client.namespace_fetches(), 1);
    }

    #[tokio::test]
    async fn namespace_objects_get_placeholder_without_fetch() {
        let client = InMemoryResourceClient::new();
        let resolver = NamespaceResolver::new(Some(&client), DEADLINE);

        let ns = resolver
            .resolve("team-a", &GroupVersionKind::namespace(), &CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(ns, Resource::namespace_placeholder(""));
        assert_eq!(client.namespace_fetches(), 0);
    }

    #[tokio::test]
    async fn cluster_scoped_requests_get_placeholder() {
        let resolver = NamespaceResolver::new(None, DEADLINE);
        let ns = resolver
            .resolve("", &pod(), &CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(ns.name(), "");
        assert_eq!(ns.kind(), "Namespace");
    }

    #[tokio::test]
    async fn without_client_namespace_is_synthesized() {
        let resolver = NamespaceResolver::new(None, DEADLINE);
        let ns = resolver
            .resolve("team-a", &pod(), &CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(ns.name(), "team-a");
    }

    #[tokio::test]
    async fn fetch_failure_is_an_error() {
        let client = InMemoryResourceClient::new();
        let resolver = NamespaceResolver::new(Some(&client), DEADLINE);

        let err = resolver
            .resolve("missing", &pod(), &CancelSignal::never())
            .await
            .unwrap_err();
        match err {
            ValidateError::NamespaceFetch { namespace, source } => {
                assert_eq!(namespace, "missing");
                assert!(matches!(source, ClientError::NotFound { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
