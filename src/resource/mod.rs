//! Connect entity kinds
//!
//! One module per kind, each holding:
//! - the declarative model (what a caller writes and what gets persisted)
//! - the codec between that model and the wire message
//! - the reconciler implementing the lifecycle against its service
//! - a lookup for finding one entity by filter
//!
//! [`Provider`] wires every reconciler to a [`connectkit::Client`] and
//! dispatches JSON documents to the right kind.

pub mod ap_binding;
pub mod attestation_policy;
pub mod cluster;
pub mod federation;
pub mod organization;
pub mod role_binding;
pub mod trust_zone;

#[cfg(test)]
pub mod fake;

use clap::ValueEnum;
use declarative::{Diagnostics, Lookup, OperationContext, ReconcileError, Reconciler, ResourceState};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;

pub use ap_binding::ApBindingReconciler;
pub use attestation_policy::AttestationPolicyReconciler;
pub use cluster::ClusterReconciler;
pub use federation::FederationReconciler;
pub use organization::OrganizationLookup;
pub use role_binding::RoleBindingReconciler;
pub use trust_zone::TrustZoneReconciler;

/// Entity kinds managed by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    TrustZone,
    Cluster,
    Federation,
    AttestationPolicy,
    ApBinding,
    RoleBinding,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TrustZone => "trust_zone",
            Self::Cluster => "cluster",
            Self::Federation => "federation",
            Self::AttestationPolicy => "attestation_policy",
            Self::ApBinding => "ap_binding",
            Self::RoleBinding => "role_binding",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Shared helpers for the kind modules
// ============================================================================

/// Wrap a transport failure under an operation summary
///
/// `context` prefixes the transport error in the detail when non-empty.
pub(crate) fn remote_error(summary: &str, context: &str, err: &connectkit::Error) -> ReconcileError {
    let detail = if context.is_empty() {
        err.to_string()
    } else {
        format!("{context}: {err}")
    };
    ReconcileError::Remote {
        summary: summary.to_string(),
        detail,
        not_found: err.is_not_found(),
    }
}

/// Run one remote call under the operation context
pub(crate) async fn call<T, F>(
    ctx: &OperationContext,
    summary: &str,
    context: &str,
    fut: F,
) -> declarative::Result<T>
where
    F: Future<Output = connectkit::Result<T>>,
{
    ctx.run(async move { fut.await.map_err(|e| remote_error(summary, context, &e)) })
        .await
}

/// Delete outcome where a missing entity counts as deleted
pub(crate) fn deleted(result: declarative::Result<()>) -> declarative::Result<()> {
    match result {
        Err(e) if e.is_not_found() => {
            log::debug!("Entity already absent: {e}");
            Ok(())
        }
        other => other,
    }
}

/// Read outcome where a missing entity is Absent
pub(crate) fn present<M>(result: declarative::Result<M>) -> declarative::Result<ResourceState<M>> {
    match result {
        Ok(model) => Ok(ResourceState::Present(model)),
        Err(e) if e.is_not_found() => Ok(ResourceState::Absent),
        Err(e) => Err(e),
    }
}

/// The remote id from persisted state, if any
pub(crate) fn state_id(id: Option<&String>) -> Option<&str> {
    id.map(String::as_str).filter(|id| !id.is_empty())
}

// ============================================================================
// Provider
// ============================================================================

/// Result of one dispatched operation
///
/// `state` is `None` when the operation failed; a successful delete or a
/// read of a missing entity yields `ResourceState::Absent`.
#[derive(Debug, Default)]
pub struct Outcome {
    pub state: Option<ResourceState<Value>>,
    pub diagnostics: Diagnostics,
}

impl Outcome {
    fn finish(mut diagnostics: Diagnostics, result: declarative::Result<ResourceState<Value>>) -> Self {
        match result {
            Ok(state) => Self {
                state: Some(state),
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(e.to_diagnostic());
                Self {
                    state: None,
                    diagnostics,
                }
            }
        }
    }

    /// Whether any error diagnostic was produced
    pub fn failed(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Every reconciler and lookup, bound to one client
pub struct Provider {
    trust_zones: TrustZoneReconciler,
    clusters: ClusterReconciler,
    federations: FederationReconciler,
    attestation_policies: AttestationPolicyReconciler,
    ap_bindings: ApBindingReconciler,
    role_bindings: RoleBindingReconciler,
    organizations: OrganizationLookup,
}

macro_rules! dispatch {
    ($self:ident, $kind:expr, $r:ident => $body:expr) => {
        match $kind {
            ResourceKind::TrustZone => {
                let $r = &$self.trust_zones;
                $body
            }
            ResourceKind::Cluster => {
                let $r = &$self.clusters;
                $body
            }
            ResourceKind::Federation => {
                let $r = &$self.federations;
                $body
            }
            ResourceKind::AttestationPolicy => {
                let $r = &$self.attestation_policies;
                $body
            }
            ResourceKind::ApBinding => {
                let $r = &$self.ap_bindings;
                $body
            }
            ResourceKind::RoleBinding => {
                let $r = &$self.role_bindings;
                $body
            }
        }
    };
}

/// Check declared configuration offline
///
/// Parses the document, runs the kind's wire encoding and collects
/// advisory warnings. The returned state is the normalized configuration.
pub fn validate(kind: ResourceKind, config: Value) -> Outcome {
    match kind {
        ResourceKind::TrustZone => check(config, |m: &trust_zone::TrustZoneModel| {
            trust_zone::encode(m)?;
            Ok(trust_zone::warnings(m))
        }),
        ResourceKind::Cluster => check(config, |m: &cluster::ClusterModel| {
            cluster::encode(m).map(|_| Diagnostics::new())
        }),
        ResourceKind::Federation => check(config, no_warnings::<federation::FederationModel>),
        ResourceKind::AttestationPolicy => {
            check(config, no_warnings::<attestation_policy::AttestationPolicyModel>)
        }
        ResourceKind::ApBinding => check(config, no_warnings::<ap_binding::ApBindingModel>),
        ResourceKind::RoleBinding => check(config, no_warnings::<role_binding::RoleBindingModel>),
    }
}

impl Provider {
    pub fn new(client: &connectkit::Client) -> Self {
        Self {
            trust_zones: TrustZoneReconciler::new(client.trust_zones()),
            clusters: ClusterReconciler::new(client.clusters()),
            federations: FederationReconciler::new(client.federations()),
            attestation_policies: AttestationPolicyReconciler::new(client.attestation_policies()),
            ap_bindings: ApBindingReconciler::new(client.ap_bindings()),
            role_bindings: RoleBindingReconciler::new(client.role_bindings()),
            organizations: OrganizationLookup::new(client.organizations()),
        }
    }

    pub async fn create(&self, kind: ResourceKind, ctx: &OperationContext, config: Value) -> Outcome {
        dispatch!(self, kind, r => create_with(r, ctx, config).await)
    }

    pub async fn read(&self, kind: ResourceKind, ctx: &OperationContext, state: Value) -> Outcome {
        dispatch!(self, kind, r => read_with(r, ctx, state).await)
    }

    pub async fn update(
        &self,
        kind: ResourceKind,
        ctx: &OperationContext,
        state: Value,
        config: Value,
    ) -> Outcome {
        dispatch!(self, kind, r => update_with(r, ctx, state, config).await)
    }

    pub async fn delete(&self, kind: ResourceKind, ctx: &OperationContext, state: Value) -> Outcome {
        dispatch!(self, kind, r => delete_with(r, ctx, state).await)
    }

    pub async fn import(&self, kind: ResourceKind, ctx: &OperationContext, key: &str) -> Outcome {
        dispatch!(self, kind, r => import_with(r, ctx, key).await)
    }

    /// Find exactly one entity of `kind` matching `filter`
    pub async fn lookup(&self, kind: ResourceKind, ctx: &OperationContext, filter: Value) -> Outcome {
        dispatch!(self, kind, r => lookup_with(r, ctx, filter).await)
    }

    /// Find an organization by exact name
    pub async fn organization(&self, ctx: &OperationContext, name: &str) -> Outcome {
        let filter = serde_json::json!({ "name": name });
        lookup_with(&self.organizations, ctx, filter).await
    }
}

fn parse<T: DeserializeOwned>(what: &str, document: Value) -> declarative::Result<T> {
    serde_json::from_value(document)
        .map_err(|e| ReconcileError::validation(format!("Invalid {what}"), e.to_string()))
}

fn render<T: Serialize>(model: &T) -> declarative::Result<ResourceState<Value>> {
    serde_json::to_value(model)
        .map(ResourceState::Present)
        .map_err(|e| ReconcileError::codec("Error encoding state", e.to_string()))
}

fn no_warnings<M>(_: &M) -> declarative::Result<Diagnostics> {
    Ok(Diagnostics::new())
}

fn check<M, F>(config: Value, inspect: F) -> Outcome
where
    M: Serialize + DeserializeOwned,
    F: FnOnce(&M) -> declarative::Result<Diagnostics>,
{
    let result = parse::<M>("configuration", config)
        .and_then(|declared| Ok((inspect(&declared)?, render(&declared)?)));
    match result {
        Ok((diagnostics, state)) => Outcome::finish(diagnostics, Ok(state)),
        Err(e) => Outcome::finish(Diagnostics::new(), Err(e)),
    }
}

async fn create_with<R>(r: &R, ctx: &OperationContext, config: Value) -> Outcome
where
    R: Reconciler,
    R::Model: Serialize + DeserializeOwned,
{
    let declared = match parse::<R::Model>("configuration", config) {
        Ok(declared) => declared,
        Err(e) => return Outcome::finish(Diagnostics::new(), Err(e)),
    };
    let diagnostics = r.validate(&declared);
    let result = r.create(ctx, &declared).await;
    Outcome::finish(diagnostics, result.and_then(|model| render(&model)))
}

async fn read_with<R>(r: &R, ctx: &OperationContext, state: Value) -> Outcome
where
    R: Reconciler,
    R::Model: Serialize + DeserializeOwned,
{
    let result = async {
        let state = parse::<R::Model>("state", state)?;
        match r.read(ctx, &state).await? {
            ResourceState::Present(model) => render(&model),
            ResourceState::Absent => Ok(ResourceState::Absent),
        }
    }
    .await;
    Outcome::finish(Diagnostics::new(), result)
}

async fn update_with<R>(r: &R, ctx: &OperationContext, state: Value, config: Value) -> Outcome
where
    R: Reconciler,
    R::Model: Serialize + DeserializeOwned,
{
    let inputs = parse::<R::Model>("state", state)
        .and_then(|state| Ok((state, parse::<R::Model>("configuration", config)?)));
    let (state, declared) = match inputs {
        Ok(inputs) => inputs,
        Err(e) => return Outcome::finish(Diagnostics::new(), Err(e)),
    };
    let diagnostics = r.validate(&declared);
    let result = r.update(ctx, &state, &declared).await;
    Outcome::finish(diagnostics, result.and_then(|model| render(&model)))
}

async fn delete_with<R>(r: &R, ctx: &OperationContext, state: Value) -> Outcome
where
    R: Reconciler,
    R::Model: DeserializeOwned,
{
    let result = async {
        let state = parse::<R::Model>("state", state)?;
        r.delete(ctx, &state).await?;
        Ok(ResourceState::Absent)
    }
    .await;
    Outcome::finish(Diagnostics::new(), result)
}

async fn import_with<R>(r: &R, ctx: &OperationContext, key: &str) -> Outcome
where
    R: Reconciler,
    R::Model: Serialize,
{
    log::debug!("Importing {} {key:?} ({:?})", r.resource_type(), r.import_strategy());
    let result = r.import(ctx, key).await;
    Outcome::finish(Diagnostics::new(), result.and_then(|model| render(&model)))
}

async fn lookup_with<L>(l: &L, ctx: &OperationContext, filter: Value) -> Outcome
where
    L: Lookup,
    L::Filter: DeserializeOwned,
    L::Model: Serialize,
{
    let result = async {
        let filter = parse::<L::Filter>("filter", filter)?;
        let model = l.lookup(ctx, &filter).await?;
        render(&model)
    }
    .await;
    Outcome::finish(Diagnostics::new(), result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::fake::FakeConnect;
    use connectkit::Client;
    use serde_json::json;
    use std::sync::Arc;

    fn provider() -> (Arc<FakeConnect>, Provider) {
        let fake = Arc::new(FakeConnect::new());
        let client = Client::with_backend(fake.clone());
        (fake, Provider::new(&client))
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ResourceKind::TrustZone.to_string(), "trust_zone");
        assert_eq!(ResourceKind::ApBinding.to_string(), "ap_binding");
    }

    #[tokio::test]
    async fn test_create_then_read() {
        let (_fake, provider) = provider();
        let ctx = OperationContext::new();

        let created = provider
            .create(
                ResourceKind::TrustZone,
                &ctx,
                json!({ "name": "prod", "trust_domain": "prod.example.org" }),
            )
            .await;
        assert!(!created.failed());
        let Some(ResourceState::Present(state)) = created.state else {
            panic!("expected state");
        };
        assert_eq!(state["org_id"], "org-42");

        let read = provider.read(ResourceKind::TrustZone, &ctx, state.clone()).await;
        assert_eq!(read.state, Some(ResourceState::Present(state)));
    }

    #[tokio::test]
    async fn test_invalid_configuration() {
        let (fake, provider) = provider();
        let outcome = provider
            .create(ResourceKind::Cluster, &OperationContext::new(), json!({ "name": 7 }))
            .await;
        assert!(outcome.failed());
        assert!(outcome.state.is_none());
        assert_eq!(
            outcome.diagnostics.iter().next().map(|d| d.summary.as_str()),
            Some("Invalid configuration")
        );
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_variant_rejected_before_any_call() {
        let (fake, provider) = provider();
        let outcome = provider
            .create(
                ResourceKind::AttestationPolicy,
                &OperationContext::new(),
                json!({ "name": "p", "static": {}, "tpm_node": {} }),
            )
            .await;
        assert!(outcome.failed());
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_validate_warns_on_management_zone() {
        let outcome = validate(
            ResourceKind::TrustZone,
            json!({ "name": "a", "trust_domain": "a.org", "is_management_zone": true }),
        );
        assert!(!outcome.failed());
        assert_eq!(outcome.diagnostics.warnings().count(), 1);
    }

    #[test]
    fn test_validate_runs_encoding() {
        let outcome = validate(
            ResourceKind::Cluster,
            json!({
                "name": "c",
                "trust_zone_id": "tz-1",
                "kubernetes_context": "kind",
                "trust_provider": { "kind": "kubernetes" },
                "profile": "kubernetes",
                "external_server": false,
                "extra_helm_values": "a: [unclosed",
            }),
        );
        assert!(outcome.failed());
        assert!(outcome.state.is_none());
    }

    #[test]
    fn test_validate_returns_normalized_config() {
        let outcome = validate(
            ResourceKind::Federation,
            json!({ "trust_zone_id": "a", "remote_trust_zone_id": "b" }),
        );
        assert!(!outcome.failed());
        assert_eq!(
            outcome.state,
            Some(ResourceState::Present(json!({
                "id": null,
                "org_id": null,
                "trust_zone_id": "a",
                "remote_trust_zone_id": "b",
            })))
        );
    }

    #[tokio::test]
    async fn test_delete_reports_absent() {
        let (_fake, provider) = provider();
        let outcome = provider
            .delete(
                ResourceKind::Federation,
                &OperationContext::new(),
                json!({ "id": "gone", "trust_zone_id": "a", "remote_trust_zone_id": "b" }),
            )
            .await;
        assert!(!outcome.failed());
        assert_eq!(outcome.state, Some(ResourceState::Absent));
    }

    #[tokio::test]
    async fn test_organization_lookup() {
        let (fake, provider) = provider();
        fake.add_organization("org-1", "acme");
        let outcome = provider.organization(&OperationContext::new(), "acme").await;
        assert_eq!(
            outcome.state,
            Some(ResourceState::Present(json!({ "id": "org-1", "name": "acme" })))
        );
    }
}
