//! Clusters
//!
//! A cluster is a Kubernetes cluster enrolled in a trust zone. Its Helm
//! overrides travel as a structured document on the wire but are written
//! as YAML or JSON text in configuration; the OIDC issuer CA certificate
//! travels as bytes and is written as base64.

use crate::codec::{
    decode_cert, encode_cert, non_empty, parse_helm_values, preserve_helm_text,
    render_helm_values,
};
use crate::resource::{call, deleted, present, state_id};
use async_trait::async_trait;
use connectkit::proto::{Cluster, TrustProvider};
use connectkit::{ClusterApi, ClusterFilter};
use declarative::{
    KindNames, Lookup, OperationContext, ReconcileError, Reconciler, ResourceState, Result, merge,
    present_or_not_found, select_single,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NAMES: KindNames = KindNames::new("cluster", "clusters");

/// The only trust provider kind the server accepts
pub const KUBERNETES: &str = "kubernetes";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrustProviderModel {
    pub kind: String,
}

/// Declared configuration and persisted state of a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterModel {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub org_id: Option<String>,
    pub trust_zone_id: String,
    pub kubernetes_context: String,
    /// Required on create; an update without one keeps the persisted value
    #[serde(default)]
    pub trust_provider: Option<TrustProviderModel>,
    /// YAML or JSON mapping
    #[serde(default)]
    pub extra_helm_values: Option<String>,
    pub profile: String,
    pub external_server: bool,
    #[serde(default)]
    pub oidc_issuer_url: Option<String>,
    /// Base64 encoded
    #[serde(default)]
    pub oidc_issuer_ca_cert: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterQuery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub trust_zone_id: Option<String>,
}

// ============================================================================
// Codec
// ============================================================================

fn encode_trust_provider(model: Option<&TrustProviderModel>) -> Result<TrustProvider> {
    let kind = model.map_or("", |tp| tp.kind.as_str());
    if kind != KUBERNETES {
        return Err(ReconcileError::validation(
            "Invalid trust provider",
            format!("Failed to create trust provider: invalid trust provider kind: {kind}"),
        ));
    }
    Ok(TrustProvider {
        kind: Some(kind.to_string()),
    })
}

/// Model to wire message
pub fn encode(model: &ClusterModel) -> Result<Cluster> {
    Ok(Cluster {
        id: model.id.clone(),
        name: Some(model.name.clone()),
        org_id: model.org_id.clone(),
        trust_zone_id: Some(model.trust_zone_id.clone()),
        kubernetes_context: Some(model.kubernetes_context.clone()),
        trust_provider: Some(encode_trust_provider(model.trust_provider.as_ref())?),
        extra_helm_values: parse_helm_values(model.extra_helm_values.as_deref())?,
        profile: Some(model.profile.clone()),
        external_server: Some(model.external_server),
        oidc_issuer_url: model.oidc_issuer_url.clone(),
        oidc_issuer_ca_cert: encode_cert(
            "oidc_issuer_ca_cert",
            model.oidc_issuer_ca_cert.as_deref(),
        )?,
    })
}

fn decode(cluster: Cluster) -> Result<ClusterModel> {
    Ok(ClusterModel {
        extra_helm_values: render_helm_values(cluster.extra_helm_values.as_ref())?,
        oidc_issuer_ca_cert: decode_cert(&cluster.oidc_issuer_ca_cert),
        id: non_empty(cluster.id),
        name: cluster.name.unwrap_or_default(),
        org_id: non_empty(cluster.org_id),
        trust_zone_id: cluster.trust_zone_id.unwrap_or_default(),
        kubernetes_context: cluster.kubernetes_context.unwrap_or_default(),
        trust_provider: non_empty(cluster.trust_provider.and_then(|tp| tp.kind))
            .map(|kind| TrustProviderModel { kind }),
        profile: cluster.profile.unwrap_or_default(),
        external_server: cluster.external_server.unwrap_or(false),
        oidc_issuer_url: non_empty(cluster.oidc_issuer_url),
    })
}

fn settle(
    response: Cluster,
    declared: Option<&ClusterModel>,
    prior: Option<&ClusterModel>,
) -> Result<ClusterModel> {
    let remote = decode(response)?;
    let helm_candidates = [
        declared.and_then(|d| d.extra_helm_values.as_deref()),
        prior.and_then(|p| p.extra_helm_values.as_deref()),
    ];

    Ok(ClusterModel {
        id: remote.id.or_else(|| prior.and_then(|p| p.id.clone())),
        org_id: merge::resolve(
            remote.org_id,
            declared.and_then(|d| d.org_id.clone()),
            prior.and_then(|p| p.org_id.clone()),
        ),
        trust_provider: remote.trust_provider.or_else(|| {
            merge::fallback(
                declared.and_then(|d| d.trust_provider.clone()),
                prior.and_then(|p| p.trust_provider.clone()),
            )
        }),
        extra_helm_values: preserve_helm_text(remote.extra_helm_values, &helm_candidates),
        oidc_issuer_url: merge::resolve(
            remote.oidc_issuer_url,
            declared.and_then(|d| d.oidc_issuer_url.clone()),
            prior.and_then(|p| p.oidc_issuer_url.clone()),
        ),
        oidc_issuer_ca_cert: merge::resolve(
            remote.oidc_issuer_ca_cert,
            declared.and_then(|d| d.oidc_issuer_ca_cert.clone()),
            prior.and_then(|p| p.oidc_issuer_ca_cert.clone()),
        ),
        ..remote
    })
}

/// State from a read
///
/// The response is authoritative. The id is carried, and Helm values keep
/// the persisted text when it still parses to the same document.
fn refresh(response: Cluster, state: &ClusterModel) -> Result<ClusterModel> {
    let remote = decode(response)?;
    Ok(ClusterModel {
        id: remote.id.or_else(|| state.id.clone()),
        extra_helm_values: preserve_helm_text(
            remote.extra_helm_values,
            &[state.extra_helm_values.as_deref()],
        ),
        ..remote
    })
}

// ============================================================================
// Reconciler
// ============================================================================

pub struct ClusterReconciler {
    api: Arc<dyn ClusterApi>,
}

impl ClusterReconciler {
    pub fn new(api: Arc<dyn ClusterApi>) -> Self {
        Self { api }
    }

    async fn fetch(&self, ctx: &OperationContext, id: &str) -> Result<Cluster> {
        call(
            ctx,
            "Error reading cluster",
            &format!("Could not read cluster {id:?}"),
            self.api.get_cluster(id),
        )
        .await
    }
}

#[async_trait]
impl Reconciler for ClusterReconciler {
    type Model = ClusterModel;

    fn resource_type(&self) -> &'static str {
        "cluster"
    }

    async fn create(&self, ctx: &OperationContext, declared: &ClusterModel) -> Result<ClusterModel> {
        let request = encode(&ClusterModel {
            id: None,
            ..declared.clone()
        })?;

        let response = call(
            ctx,
            "Error creating cluster",
            "Could not create cluster",
            self.api.create_cluster(request),
        )
        .await?;
        log::info!("Created cluster {:?}", response.id.as_deref().unwrap_or_default());
        settle(response, Some(declared), None)
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        state: &ClusterModel,
    ) -> Result<ResourceState<ClusterModel>> {
        let Some(id) = state_id(state.id.as_ref()) else {
            return Ok(ResourceState::Absent);
        };
        match present(self.fetch(ctx, id).await)? {
            ResourceState::Present(cluster) => refresh(cluster, state).map(ResourceState::Present),
            ResourceState::Absent => Ok(ResourceState::Absent),
        }
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        state: &ClusterModel,
        declared: &ClusterModel,
    ) -> Result<ClusterModel> {
        let id = state_id(state.id.as_ref()).ok_or_else(|| ReconcileError::MissingId {
            kind: NAMES.singular,
            detail: "Cluster ID not found in state.".to_string(),
        })?;

        let request = encode(&ClusterModel {
            id: Some(id.to_string()),
            org_id: merge::carry_identity(declared.org_id.clone(), state.org_id.clone()),
            trust_provider: merge::fallback(
                declared.trust_provider.clone(),
                state.trust_provider.clone(),
            ),
            oidc_issuer_url: merge::carry_identity(
                declared.oidc_issuer_url.clone(),
                state.oidc_issuer_url.clone(),
            ),
            oidc_issuer_ca_cert: merge::carry_identity(
                declared.oidc_issuer_ca_cert.clone(),
                state.oidc_issuer_ca_cert.clone(),
            ),
            ..declared.clone()
        })?;

        let response = call(
            ctx,
            "Error updating cluster",
            "",
            self.api.update_cluster(request),
        )
        .await?;
        settle(response, Some(declared), Some(state))
    }

    async fn delete(&self, ctx: &OperationContext, state: &ClusterModel) -> Result<()> {
        let Some(id) = state_id(state.id.as_ref()) else {
            return Ok(());
        };
        deleted(call(ctx, "Error deleting cluster", "", self.api.destroy_cluster(id)).await)
    }

    async fn import(&self, ctx: &OperationContext, key: &str) -> Result<ClusterModel> {
        let cluster = present_or_not_found(present(self.fetch(ctx, key).await)?, NAMES, key)?;
        settle(cluster, None, None)
    }
}

#[async_trait]
impl Lookup for ClusterReconciler {
    type Filter = ClusterQuery;
    type Model = ClusterModel;

    async fn lookup(&self, ctx: &OperationContext, filter: &ClusterQuery) -> Result<ClusterModel> {
        let filter = ClusterFilter {
            name: filter.name.clone(),
            org_id: filter.org_id.clone(),
            trust_zone_id: filter.trust_zone_id.clone(),
        };
        let clusters = call(
            ctx,
            "Error reading cluster",
            "Could not list clusters",
            self.api.list_clusters(filter),
        )
        .await?;
        let cluster = select_single(clusters, NAMES, "Error reading cluster", |_| true)?;
        settle(cluster, None, None)
    }
}
