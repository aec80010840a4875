//! Attestation policies
//!
//! A policy decides which workloads receive an identity. Its body is one
//! of three variants. Configuration spells each variant as its own
//! optional block, and exactly one block must be present; the model holds
//! the chosen variant as an enum so an invalid combination cannot reach
//! the wire.
//!
//! Policies are imported by name rather than id.

use crate::codec::non_empty;
use crate::resource::{call, deleted, present, state_id};
use async_trait::async_trait;
use connectkit::proto::attestation_policy::attestation_policy::Policy;
use connectkit::proto::{
    ApKubernetes, ApLabelSelector, ApMatchExpression, ApStatic, ApTpmNode, AttestationPolicy,
    Selector, TpmAttestation,
};
use connectkit::{AttestationPolicyApi, AttestationPolicyFilter};
use declarative::{
    ImportStrategy, KindNames, Lookup, OperationContext, ReconcileError, Reconciler,
    ResourceState, Result, merge, select_single,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

const NAMES: KindNames = KindNames::new("attestation policy", "attestation policies");

// ============================================================================
// Model
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchExpression {
    pub key: String,
    pub operator: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelSelector {
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub match_expressions: Vec<MatchExpression>,
}

/// Workloads selected by Kubernetes namespace and pod labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KubernetesPolicy {
    #[serde(default)]
    pub namespace_selector: Option<LabelSelector>,
    #[serde(default)]
    pub pod_selector: Option<LabelSelector>,
    #[serde(default)]
    pub dns_name_templates: Vec<String>,
    #[serde(default)]
    pub spiffe_id_path_template: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticSelector {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// A single workload identified by fixed selectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticPolicy {
    pub spiffe_id_path: String,
    pub parent_id_path: String,
    pub selectors: Vec<StaticSelector>,
    #[serde(default)]
    pub dns_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TpmAttestationModel {
    pub ek_hash: String,
}

/// A node identified by its TPM endorsement key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TpmNodePolicy {
    pub attestation: TpmAttestationModel,
    #[serde(default)]
    pub selector_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyVariant {
    Kubernetes(KubernetesPolicy),
    Static(StaticPolicy),
    TpmNode(TpmNodePolicy),
}

/// Declared configuration and persisted state of an attestation policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicyDocument", into = "PolicyDocument")]
pub struct AttestationPolicyModel {
    pub id: Option<String>,
    pub name: String,
    pub org_id: Option<String>,
    pub policy: PolicyVariant,
}

/// Configuration shape: one optional block per variant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyDocument {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kubernetes: Option<KubernetesPolicy>,
    #[serde(default, rename = "static", skip_serializing_if = "Option::is_none")]
    static_policy: Option<StaticPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tpm_node: Option<TpmNodePolicy>,
}

fn variant_count_message(found: &str) -> String {
    format!(
        "Exactly one of kubernetes, static or tpm_node blocks must be configured, but {found} were provided."
    )
}

impl TryFrom<PolicyDocument> for AttestationPolicyModel {
    type Error = String;

    fn try_from(doc: PolicyDocument) -> std::result::Result<Self, Self::Error> {
        let policy = match (doc.kubernetes, doc.static_policy, doc.tpm_node) {
            (Some(k8s), None, None) => PolicyVariant::Kubernetes(k8s),
            (None, Some(fixed), None) => PolicyVariant::Static(fixed),
            (None, None, Some(tpm)) => PolicyVariant::TpmNode(tpm),
            (None, None, None) => return Err(variant_count_message("none")),
            _ => return Err(variant_count_message("multiple")),
        };
        Ok(Self {
            id: doc.id,
            name: doc.name,
            org_id: doc.org_id,
            policy,
        })
    }
}

impl From<AttestationPolicyModel> for PolicyDocument {
    fn from(model: AttestationPolicyModel) -> Self {
        let mut doc = Self {
            id: model.id,
            name: model.name,
            org_id: model.org_id,
            ..Self::default()
        };
        match model.policy {
            PolicyVariant::Kubernetes(k8s) => doc.kubernetes = Some(k8s),
            PolicyVariant::Static(fixed) => doc.static_policy = Some(fixed),
            PolicyVariant::TpmNode(tpm) => doc.tpm_node = Some(tpm),
        }
        doc
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttestationPolicyQuery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
}

// ============================================================================
// Codec
// ============================================================================

fn encode_selector(selector: &LabelSelector) -> ApLabelSelector {
    ApLabelSelector {
        match_labels: selector.match_labels.clone(),
        match_expressions: selector
            .match_expressions
            .iter()
            .map(|expr| ApMatchExpression {
                key: expr.key.clone(),
                operator: expr.operator.clone(),
                values: expr.values.clone(),
            })
            .collect(),
    }
}

fn decode_selector(selector: ApLabelSelector) -> LabelSelector {
    LabelSelector {
        match_labels: selector.match_labels,
        match_expressions: selector
            .match_expressions
            .into_iter()
            .map(|expr| MatchExpression {
                key: expr.key,
                operator: expr.operator,
                values: expr.values,
            })
            .collect(),
    }
}

fn encode_variant(variant: &PolicyVariant) -> Policy {
    match variant {
        PolicyVariant::Kubernetes(k8s) => Policy::Kubernetes(ApKubernetes {
            namespace_selector: k8s.namespace_selector.as_ref().map(encode_selector),
            pod_selector: k8s.pod_selector.as_ref().map(encode_selector),
            dns_name_templates: k8s.dns_name_templates.clone(),
            spiffe_id_path_template: k8s.spiffe_id_path_template.clone(),
        }),
        PolicyVariant::Static(fixed) => Policy::Static(ApStatic {
            spiffe_id_path: Some(fixed.spiffe_id_path.clone()),
            parent_id_path: Some(fixed.parent_id_path.clone()),
            selectors: fixed
                .selectors
                .iter()
                .map(|s| Selector {
                    r#type: s.kind.clone(),
                    value: s.value.clone(),
                })
                .collect(),
            dns_names: fixed.dns_names.clone(),
        }),
        PolicyVariant::TpmNode(tpm) => Policy::TpmNode(ApTpmNode {
            attestation: Some(TpmAttestation {
                ek_hash: Some(tpm.attestation.ek_hash.clone()),
            }),
            selector_values: tpm.selector_values.clone(),
        }),
    }
}

fn decode_variant(policy: Policy) -> PolicyVariant {
    match policy {
        Policy::Kubernetes(k8s) => PolicyVariant::Kubernetes(KubernetesPolicy {
            namespace_selector: k8s.namespace_selector.map(decode_selector),
            pod_selector: k8s.pod_selector.map(decode_selector),
            dns_name_templates: k8s.dns_name_templates,
            spiffe_id_path_template: non_empty(k8s.spiffe_id_path_template),
        }),
        Policy::Static(fixed) => PolicyVariant::Static(StaticPolicy {
            spiffe_id_path: fixed.spiffe_id_path.unwrap_or_default(),
            parent_id_path: fixed.parent_id_path.unwrap_or_default(),
            selectors: fixed
                .selectors
                .into_iter()
                .map(|s| StaticSelector {
                    kind: s.r#type,
                    value: s.value,
                })
                .collect(),
            dns_names: fixed.dns_names,
        }),
        Policy::TpmNode(tpm) => PolicyVariant::TpmNode(TpmNodePolicy {
            attestation: TpmAttestationModel {
                ek_hash: tpm
                    .attestation
                    .and_then(|a| a.ek_hash)
                    .unwrap_or_default(),
            },
            selector_values: tpm.selector_values,
        }),
    }
}

pub fn encode(model: &AttestationPolicyModel) -> AttestationPolicy {
    AttestationPolicy {
        id: model.id.clone(),
        name: model.name.clone(),
        org_id: model.org_id.clone(),
        policy: Some(encode_variant(&model.policy)),
    }
}

fn decode(response: AttestationPolicy) -> Result<AttestationPolicyModel> {
    let policy = response.policy.map(decode_variant).ok_or_else(|| {
        ReconcileError::codec(
            "Error processing attestation policy",
            format!("attestation policy {:?} has no policy body", response.name),
        )
    })?;

    Ok(AttestationPolicyModel {
        id: non_empty(response.id),
        org_id: non_empty(response.org_id),
        name: response.name,
        policy,
    })
}

fn settle(
    response: AttestationPolicy,
    declared: Option<&AttestationPolicyModel>,
    prior: Option<&AttestationPolicyModel>,
) -> Result<AttestationPolicyModel> {
    let remote = decode(response)?;
    Ok(AttestationPolicyModel {
        id: remote.id.or_else(|| prior.and_then(|p| p.id.clone())),
        org_id: merge::resolve(
            remote.org_id,
            declared.and_then(|d| d.org_id.clone()),
            prior.and_then(|p| p.org_id.clone()),
        ),
        ..remote
    })
}

/// Reads take the response as is, keeping only the persisted id
fn refresh(
    response: AttestationPolicy,
    state: &AttestationPolicyModel,
) -> Result<AttestationPolicyModel> {
    let remote = decode(response)?;
    Ok(AttestationPolicyModel {
        id: remote.id.or_else(|| state.id.clone()),
        ..remote
    })
}

// ============================================================================
// Reconciler
// ============================================================================

pub struct AttestationPolicyReconciler {
    api: Arc<dyn AttestationPolicyApi>,
}

impl AttestationPolicyReconciler {
    pub fn new(api: Arc<dyn AttestationPolicyApi>) -> Self {
        Self { api }
    }

    async fn list(
        &self,
        ctx: &OperationContext,
        summary: &str,
        filter: AttestationPolicyFilter,
    ) -> Result<Vec<AttestationPolicy>> {
        call(
            ctx,
            summary,
            "Could not list attestation policies",
            self.api.list_attestation_policies(filter),
        )
        .await
    }
}

#[async_trait]
impl Reconciler for AttestationPolicyReconciler {
    type Model = AttestationPolicyModel;

    fn resource_type(&self) -> &'static str {
        "attestation_policy"
    }

    fn import_strategy(&self) -> ImportStrategy {
        ImportStrategy::LookupByName
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        declared: &AttestationPolicyModel,
    ) -> Result<AttestationPolicyModel> {
        let request = encode(&AttestationPolicyModel {
            id: None,
            ..declared.clone()
        });
        let response = call(
            ctx,
            "Error creating attestation policy",
            "Could not create attestation policy",
            self.api.create_attestation_policy(request),
        )
        .await?;
        log::info!(
            "Created attestation policy {:?}",
            response.id.as_deref().unwrap_or_default()
        );
        settle(response, Some(declared), None)
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        state: &AttestationPolicyModel,
    ) -> Result<ResourceState<AttestationPolicyModel>> {
        let Some(id) = state_id(state.id.as_ref()) else {
            return Ok(ResourceState::Absent);
        };
        let response = call(
            ctx,
            "Error reading attestation policy",
            &format!("Could not read attestation policy {id:?}"),
            self.api.get_attestation_policy(id),
        )
        .await;
        match present(response)? {
            ResourceState::Present(policy) => refresh(policy, state).map(ResourceState::Present),
            ResourceState::Absent => Ok(ResourceState::Absent),
        }
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        state: &AttestationPolicyModel,
        declared: &AttestationPolicyModel,
    ) -> Result<AttestationPolicyModel> {
        let id = state_id(state.id.as_ref()).ok_or_else(|| ReconcileError::MissingId {
            kind: NAMES.singular,
            detail: "Policy ID not found in state. The resource might not have been created properly."
                .to_string(),
        })?;

        let request = encode(&AttestationPolicyModel {
            id: Some(id.to_string()),
            org_id: merge::carry_identity(declared.org_id.clone(), state.org_id.clone()),
            ..declared.clone()
        });
        let response = call(
            ctx,
            "Error updating attestation policy",
            "Could not update attestation policy",
            self.api.update_attestation_policy(request),
        )
        .await?;
        settle(response, Some(declared), Some(state))
    }

    async fn delete(&self, ctx: &OperationContext, state: &AttestationPolicyModel) -> Result<()> {
        let Some(id) = state_id(state.id.as_ref()) else {
            return Ok(());
        };
        deleted(
            call(
                ctx,
                "Error deleting attestation policy",
                "Could not delete attestation policy",
                self.api.destroy_attestation_policy(id),
            )
            .await,
        )
    }

    /// `key` is the policy name, which must match exactly one policy
    async fn import(&self, ctx: &OperationContext, key: &str) -> Result<AttestationPolicyModel> {
        let summary = "Error importing attestation policy";
        let filter = AttestationPolicyFilter {
            name: Some(key.to_string()),
            org_id: None,
        };
        let policies = self.list(ctx, summary, filter).await?;
        let policy = select_single(policies, NAMES, summary, |p| p.name == key)?;
        decode(policy)
    }
}

#[async_trait]
impl Lookup for AttestationPolicyReconciler {
    type Filter = AttestationPolicyQuery;
    type Model = AttestationPolicyModel;

    async fn lookup(
        &self,
        ctx: &OperationContext,
        filter: &AttestationPolicyQuery,
    ) -> Result<AttestationPolicyModel> {
        let summary = "Error reading attestation policy";
        let filter = AttestationPolicyFilter {
            name: filter.name.clone(),
            org_id: filter.org_id.clone(),
        };
        let policies = self.list(ctx, summary, filter).await?;
        let policy = select_single(policies, NAMES, summary, |_| true)?;
        decode(policy)
    }
}
