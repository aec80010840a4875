//! Federations between two trust zones
//!
//! The server has no update call: changing a federation means replacing it.

use crate::codec::non_empty;
use crate::resource::{call, deleted, present, state_id};
use async_trait::async_trait;
use connectkit::proto::Federation;
use connectkit::{FederationApi, FederationFilter};
use declarative::{
    KindNames, Lookup, OperationContext, ReconcileError, Reconciler, ResourceState, Result, merge,
    present_or_not_found, select_single,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NAMES: KindNames = KindNames::new("federation", "federations");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FederationModel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    pub trust_zone_id: String,
    pub remote_trust_zone_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FederationQuery {
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub trust_zone_id: Option<String>,
    #[serde(default)]
    pub remote_trust_zone_id: Option<String>,
}

pub fn encode(model: &FederationModel) -> Federation {
    Federation {
        id: model.id.clone(),
        org_id: model.org_id.clone(),
        trust_zone_id: Some(model.trust_zone_id.clone()),
        remote_trust_zone_id: Some(model.remote_trust_zone_id.clone()),
    }
}

fn decode(federation: Federation) -> FederationModel {
    FederationModel {
        id: non_empty(federation.id),
        org_id: non_empty(federation.org_id),
        trust_zone_id: federation.trust_zone_id.unwrap_or_default(),
        remote_trust_zone_id: federation.remote_trust_zone_id.unwrap_or_default(),
    }
}

fn settle(
    response: Federation,
    declared: Option<&FederationModel>,
    prior: Option<&FederationModel>,
) -> FederationModel {
    let remote = decode(response);
    FederationModel {
        id: remote.id.or_else(|| prior.and_then(|p| p.id.clone())),
        org_id: merge::resolve(
            remote.org_id,
            declared.and_then(|d| d.org_id.clone()),
            prior.and_then(|p| p.org_id.clone()),
        ),
        ..remote
    }
}

/// Reads take the response as is, keeping only the persisted id
fn refresh(response: Federation, state: &FederationModel) -> FederationModel {
    let remote = decode(response);
    FederationModel {
        id: remote.id.or_else(|| state.id.clone()),
        ..remote
    }
}

pub struct FederationReconciler {
    api: Arc<dyn FederationApi>,
}

impl FederationReconciler {
    pub fn new(api: Arc<dyn FederationApi>) -> Self {
        Self { api }
    }

    async fn fetch(&self, ctx: &OperationContext, id: &str) -> Result<Federation> {
        call(
            ctx,
            "Error reading federation",
            &format!("Could not read federation {id:?}"),
            self.api.get_federation(id),
        )
        .await
    }
}

#[async_trait]
impl Reconciler for FederationReconciler {
    type Model = FederationModel;

    fn resource_type(&self) -> &'static str {
        "federation"
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        declared: &FederationModel,
    ) -> Result<FederationModel> {
        let request = encode(&FederationModel {
            id: None,
            ..declared.clone()
        });
        let response = call(
            ctx,
            "Error creating Federation",
            "Could not create federation",
            self.api.create_federation(request),
        )
        .await?;
        log::info!("Created federation {:?}", response.id.as_deref().unwrap_or_default());
        Ok(settle(response, Some(declared), None))
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        state: &FederationModel,
    ) -> Result<ResourceState<FederationModel>> {
        let Some(id) = state_id(state.id.as_ref()) else {
            return Ok(ResourceState::Absent);
        };
        Ok(present(self.fetch(ctx, id).await)?.map(|f| refresh(f, state)))
    }

    async fn update(
        &self,
        _ctx: &OperationContext,
        _state: &FederationModel,
        _declared: &FederationModel,
    ) -> Result<FederationModel> {
        Err(ReconcileError::unsupported(
            "Federation Update Not Supported",
            "The Connect API does not support updating federations.",
        ))
    }

    async fn delete(&self, ctx: &OperationContext, state: &FederationModel) -> Result<()> {
        let Some(id) = state_id(state.id.as_ref()) else {
            return Ok(());
        };
        deleted(call(ctx, "Error deleting federation", "", self.api.destroy_federation(id)).await)
    }

    async fn import(&self, ctx: &OperationContext, key: &str) -> Result<FederationModel> {
        let federation = present(self.fetch(ctx, key).await)?;
        present_or_not_found(federation.map(decode), NAMES, key)
    }
}

#[async_trait]
impl Lookup for FederationReconciler {
    type Filter = FederationQuery;
    type Model = FederationModel;

    async fn lookup(
        &self,
        ctx: &OperationContext,
        filter: &FederationQuery,
    ) -> Result<FederationModel> {
        let filter = FederationFilter {
            org_id: filter.org_id.clone(),
            trust_zone_id: filter.trust_zone_id.clone(),
            remote_trust_zone_id: filter.remote_trust_zone_id.clone(),
        };
        let federations = call(
            ctx,
            "Error Reading Federation",
            "Could not list federations",
            self.api.list_federations(filter),
        )
        .await?;
        let federation = select_single(federations, NAMES, "Error Reading Federation", |_| true)?;
        Ok(decode(federation))
    }
}
