//! Attestation policy bindings
//!
//! A binding applies an attestation policy to a trust zone, optionally
//! extending it to federated trust zones. The service has no get-by-id
//! call, so reads list with the binding's own attributes as the filter and
//! pick the binding by id.

use crate::codec::non_empty;
use crate::resource::{call, deleted, state_id};
use async_trait::async_trait;
use connectkit::proto::{ApBinding, ApBindingFederation};
use connectkit::{ApBindingApi, ApBindingFilter};
use declarative::{
    KindNames, Lookup, OperationContext, ReconcileError, Reconciler, ResourceState, Result, merge,
    select_single,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NAMES: KindNames = KindNames::new("attestation policy binding", "attestation policy bindings");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FederatedZone {
    pub trust_zone_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApBindingModel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    pub trust_zone_id: String,
    pub policy_id: String,
    #[serde(default)]
    pub federations: Vec<FederatedZone>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApBindingQuery {
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub trust_zone_id: Option<String>,
    #[serde(default)]
    pub policy_id: Option<String>,
}

pub fn encode(model: &ApBindingModel) -> ApBinding {
    ApBinding {
        id: model.id.clone(),
        org_id: model.org_id.clone(),
        trust_zone_id: Some(model.trust_zone_id.clone()),
        policy_id: Some(model.policy_id.clone()),
        federations: model
            .federations
            .iter()
            .map(|f| ApBindingFederation {
                trust_zone_id: Some(f.trust_zone_id.clone()),
            })
            .collect(),
    }
}

fn decode(binding: ApBinding) -> ApBindingModel {
    ApBindingModel {
        id: non_empty(binding.id),
        org_id: non_empty(binding.org_id),
        trust_zone_id: binding.trust_zone_id.unwrap_or_default(),
        policy_id: binding.policy_id.unwrap_or_default(),
        federations: binding
            .federations
            .into_iter()
            .map(|f| FederatedZone {
                trust_zone_id: f.trust_zone_id.unwrap_or_default(),
            })
            .collect(),
    }
}

fn settle(
    response: ApBinding,
    declared: Option<&ApBindingModel>,
    prior: Option<&ApBindingModel>,
) -> ApBindingModel {
    let remote = decode(response);
    ApBindingModel {
        id: remote.id.or_else(|| prior.and_then(|p| p.id.clone())),
        org_id: merge::resolve(
            remote.org_id,
            declared.and_then(|d| d.org_id.clone()),
            prior.and_then(|p| p.org_id.clone()),
        ),
        ..remote
    }
}

pub struct ApBindingReconciler {
    api: Arc<dyn ApBindingApi>,
}

impl ApBindingReconciler {
    pub fn new(api: Arc<dyn ApBindingApi>) -> Self {
        Self { api }
    }

    async fn list(
        &self,
        ctx: &OperationContext,
        summary: &str,
        filter: ApBindingFilter,
    ) -> Result<Vec<ApBinding>> {
        call(
            ctx,
            summary,
            "Could not list AP bindings",
            self.api.list_ap_bindings(filter),
        )
        .await
    }
}

#[async_trait]
impl Reconciler for ApBindingReconciler {
    type Model = ApBindingModel;

    fn resource_type(&self) -> &'static str {
        "ap_binding"
    }

    async fn create(&self, ctx: &OperationContext, declared: &ApBindingModel) -> Result<ApBindingModel> {
        let request = encode(&ApBindingModel {
            id: None,
            ..declared.clone()
        });
        let response = call(
            ctx,
            "Error creating AP binding",
            "",
            self.api.create_ap_binding(request),
        )
        .await?;
        log::info!("Created AP binding {:?}", response.id.as_deref().unwrap_or_default());
        Ok(settle(response, Some(declared), None))
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        state: &ApBindingModel,
    ) -> Result<ResourceState<ApBindingModel>> {
        let Some(id) = state_id(state.id.as_ref()) else {
            return Ok(ResourceState::Absent);
        };
        let filter = ApBindingFilter {
            org_id: state.org_id.clone(),
            trust_zone_id: Some(state.trust_zone_id.clone()),
            policy_id: Some(state.policy_id.clone()),
        };
        let bindings = self.list(ctx, "Error reading AP binding", filter).await?;

        // A binding that no longer matches its own attributes is gone
        Ok(bindings
            .into_iter()
            .find(|b| b.id.as_deref() == Some(id))
            .map_or(ResourceState::Absent, |b| ResourceState::Present(decode(b))))
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        state: &ApBindingModel,
        declared: &ApBindingModel,
    ) -> Result<ApBindingModel> {
        let id = state_id(state.id.as_ref()).ok_or_else(|| ReconcileError::MissingId {
            kind: NAMES.singular,
            detail: "AP binding ID not found in state.".to_string(),
        })?;

        let request = encode(&ApBindingModel {
            id: Some(id.to_string()),
            org_id: merge::carry_identity(declared.org_id.clone(), state.org_id.clone()),
            ..declared.clone()
        });
        let response = call(
            ctx,
            "Error updating AP binding",
            "",
            self.api.update_ap_binding(request),
        )
        .await?;
        Ok(settle(response, Some(declared), Some(state)))
    }

    async fn delete(&self, ctx: &OperationContext, state: &ApBindingModel) -> Result<()> {
        let Some(id) = state_id(state.id.as_ref()) else {
            return Ok(());
        };
        deleted(call(ctx, "Error deleting AP binding", "", self.api.destroy_ap_binding(id)).await)
    }

    async fn import(&self, ctx: &OperationContext, key: &str) -> Result<ApBindingModel> {
        let summary = "Error importing AP binding";
        let bindings = self.list(ctx, summary, ApBindingFilter::default()).await?;
        let binding = select_single(bindings, NAMES, summary, |b| b.id.as_deref() == Some(key))?;
        Ok(decode(binding))
    }
}

#[async_trait]
impl Lookup for ApBindingReconciler {
    type Filter = ApBindingQuery;
    type Model = ApBindingModel;

    async fn lookup(&self, ctx: &OperationContext, filter: &ApBindingQuery) -> Result<ApBindingModel> {
        let summary = "Error reading AP binding";
        let filter = ApBindingFilter {
            org_id: filter.org_id.clone(),
            trust_zone_id: filter.trust_zone_id.clone(),
            policy_id: filter.policy_id.clone(),
        };
        let bindings = self.list(ctx, summary, filter).await?;
        let binding = select_single(bindings, NAMES, summary, |_| true)?;
        Ok(decode(binding))
    }
}
