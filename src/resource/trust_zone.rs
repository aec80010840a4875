//! Trust zones
//!
//! A trust zone is a SPIFFE trust domain managed by Connect. The server
//! assigns the bundle endpoint and JWT issuer; the owning organization and
//! the management flag may be declared or left to the server.

use crate::codec::{non_empty, non_empty_str};
use crate::resource::{call, deleted, present, state_id};
use async_trait::async_trait;
use connectkit::proto::{BundleEndpointProfile, TrustZone};
use connectkit::{TrustZoneApi, TrustZoneFilter};
use declarative::{
    Diagnostics, KindNames, Lookup, OperationContext, ReconcileError, Reconciler, ResourceState, Result,
    merge, present_or_not_found, select_single,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NAMES: KindNames = KindNames::new("trust zone", "trust zones");

/// Declared configuration and persisted state of a trust zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrustZoneModel {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub trust_domain: String,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub is_management_zone: Option<bool>,
    #[serde(default)]
    pub bundle_endpoint_url: Option<String>,
    /// Schema name, e.g. `BUNDLE_ENDPOINT_PROFILE_HTTPS_SPIFFE`
    #[serde(default)]
    pub bundle_endpoint_profile: Option<String>,
    #[serde(default)]
    pub jwt_issuer: Option<String>,
}

/// Lookup filter; any subset of fields may be set
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrustZoneQuery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub trust_domain: Option<String>,
}

// ============================================================================
// Codec
// ============================================================================

fn encode_profile(value: Option<&str>) -> Result<i32> {
    match value {
        None | Some("") => Ok(BundleEndpointProfile::Unspecified as i32),
        Some(name) => BundleEndpointProfile::from_str_name(name)
            .map(|profile| profile as i32)
            .ok_or_else(|| {
                ReconcileError::codec(
                    "Invalid bundle_endpoint_profile",
                    format!("unknown bundle endpoint profile {name:?}"),
                )
            }),
    }
}

fn decode_profile(value: i32) -> Option<String> {
    match BundleEndpointProfile::try_from(value) {
        Ok(BundleEndpointProfile::Unspecified) => None,
        Ok(profile) => Some(profile.as_str_name().to_string()),
        Err(_) => Some(value.to_string()),
    }
}

/// Model to wire message
pub fn encode(model: &TrustZoneModel) -> Result<TrustZone> {
    Ok(TrustZone {
        id: model.id.clone(),
        name: model.name.clone(),
        trust_domain: model.trust_domain.clone(),
        org_id: model.org_id.clone(),
        is_management_zone: model.is_management_zone.unwrap_or(false),
        bundle_endpoint_url: model.bundle_endpoint_url.clone().unwrap_or_default(),
        bundle_endpoint_profile: encode_profile(model.bundle_endpoint_profile.as_deref())?,
        jwt_issuer: model.jwt_issuer.clone().unwrap_or_default(),
    })
}

/// Wire message to model, empty values read as unset
fn decode(trust_zone: TrustZone) -> TrustZoneModel {
    TrustZoneModel {
        id: non_empty(trust_zone.id),
        name: trust_zone.name,
        trust_domain: trust_zone.trust_domain,
        org_id: non_empty(trust_zone.org_id),
        is_management_zone: trust_zone.is_management_zone.then_some(true),
        bundle_endpoint_url: non_empty_str(trust_zone.bundle_endpoint_url),
        bundle_endpoint_profile: decode_profile(trust_zone.bundle_endpoint_profile),
        jwt_issuer: non_empty_str(trust_zone.jwt_issuer),
    }
}

/// New state from a response, the declared configuration and prior state
fn settle(
    response: TrustZone,
    declared: Option<&TrustZoneModel>,
    prior: Option<&TrustZoneModel>,
) -> TrustZoneModel {
    let management = response.is_management_zone;
    let remote = decode(response);
    TrustZoneModel {
        id: remote.id.or_else(|| prior.and_then(|p| p.id.clone())),
        org_id: merge::resolve(
            remote.org_id,
            declared.and_then(|d| d.org_id.clone()),
            prior.and_then(|p| p.org_id.clone()),
        ),
        is_management_zone: merge::resolve(
            Some(management),
            declared.and_then(|d| d.is_management_zone),
            prior.and_then(|p| p.is_management_zone),
        ),
        bundle_endpoint_url: merge::resolve(
            remote.bundle_endpoint_url,
            None,
            prior.and_then(|p| p.bundle_endpoint_url.clone()),
        ),
        bundle_endpoint_profile: merge::resolve(
            remote.bundle_endpoint_profile,
            None,
            prior.and_then(|p| p.bundle_endpoint_profile.clone()),
        ),
        jwt_issuer: merge::resolve(
            remote.jwt_issuer,
            None,
            prior.and_then(|p| p.jwt_issuer.clone()),
        ),
        name: remote.name,
        trust_domain: remote.trust_domain,
    }
}

/// State from a read: the response is authoritative, only the id is carried
fn refresh(response: TrustZone, state: &TrustZoneModel) -> TrustZoneModel {
    let remote = decode(response);
    TrustZoneModel {
        id: remote.id.or_else(|| state.id.clone()),
        ..remote
    }
}

/// Advisory checks on declared configuration
pub fn warnings(declared: &TrustZoneModel) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    if declared.is_management_zone.is_some() {
        diagnostics.add_warning(
            "is_management_zone is immutable",
            "The is_management_zone field cannot be modified after creation. Create a new trust zone instead.",
        );
    }
    diagnostics
}

// ============================================================================
// Reconciler
// ============================================================================

pub struct TrustZoneReconciler {
    api: Arc<dyn TrustZoneApi>,
}

impl TrustZoneReconciler {
    pub fn new(api: Arc<dyn TrustZoneApi>) -> Self {
        Self { api }
    }

    async fn fetch(&self, ctx: &OperationContext, id: &str) -> Result<TrustZone> {
        call(
            ctx,
            "Error reading trust zone",
            &format!("Could not read trust zone {id:?}"),
            self.api.get_trust_zone(id),
        )
        .await
    }
}

#[async_trait]
impl Reconciler for TrustZoneReconciler {
    type Model = TrustZoneModel;

    fn resource_type(&self) -> &'static str {
        "trust_zone"
    }

    fn validate(&self, declared: &TrustZoneModel) -> Diagnostics {
        warnings(declared)
    }

    async fn create(&self, ctx: &OperationContext, declared: &TrustZoneModel) -> Result<TrustZoneModel> {
        let request = encode(&TrustZoneModel {
            id: None,
            bundle_endpoint_url: None,
            bundle_endpoint_profile: None,
            jwt_issuer: None,
            ..declared.clone()
        })?;

        let response = call(
            ctx,
            "Error creating trust zone",
            "Could not create trust zone",
            self.api.create_trust_zone(request),
        )
        .await?;
        log::info!("Created trust zone {:?}", response.id.as_deref().unwrap_or_default());
        Ok(settle(response, Some(declared), None))
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        state: &TrustZoneModel,
    ) -> Result<ResourceState<TrustZoneModel>> {
        let Some(id) = state_id(state.id.as_ref()) else {
            return Ok(ResourceState::Absent);
        };
        let response = present(self.fetch(ctx, id).await)?;
        Ok(response.map(|tz| refresh(tz, state)))
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        state: &TrustZoneModel,
        declared: &TrustZoneModel,
    ) -> Result<TrustZoneModel> {
        let id = state_id(state.id.as_ref()).ok_or_else(|| ReconcileError::MissingId {
            kind: NAMES.singular,
            detail: "Trust zone ID not found in state.".to_string(),
        })?;

        // Computed attributes are resent as last seen
        let request = encode(&TrustZoneModel {
            id: Some(id.to_string()),
            org_id: merge::carry_identity(declared.org_id.clone(), state.org_id.clone()),
            is_management_zone: merge::fallback(declared.is_management_zone, state.is_management_zone),
            bundle_endpoint_url: state.bundle_endpoint_url.clone(),
            bundle_endpoint_profile: state.bundle_endpoint_profile.clone(),
            jwt_issuer: state.jwt_issuer.clone(),
            ..declared.clone()
        })?;

        let response = call(
            ctx,
            "Error updating trust zone",
            "Could not update trust zone",
            self.api.update_trust_zone(request),
        )
        .await?;
        Ok(settle(response, Some(declared), Some(state)))
    }

    async fn delete(&self, ctx: &OperationContext, state: &TrustZoneModel) -> Result<()> {
        let Some(id) = state_id(state.id.as_ref()) else {
            return Ok(());
        };
        deleted(call(ctx, "Error deleting trust zone", "", self.api.destroy_trust_zone(id)).await)
    }

    async fn import(&self, ctx: &OperationContext, key: &str) -> Result<TrustZoneModel> {
        let response = present(self.fetch(ctx, key).await)?;
        present_or_not_found(response.map(|tz| settle(tz, None, None)), NAMES, key)
    }
}

#[async_trait]
impl Lookup for TrustZoneReconciler {
    type Filter = TrustZoneQuery;
    type Model = TrustZoneModel;

    async fn lookup(&self, ctx: &OperationContext, filter: &TrustZoneQuery) -> Result<TrustZoneModel> {
        let filter = TrustZoneFilter {
            name: filter.name.clone(),
            org_id: filter.org_id.clone(),
            trust_domain: filter.trust_domain.clone(),
        };
        let zones = call(
            ctx,
            "Error reading trust zone",
            "Could not list trust zones",
            self.api.list_trust_zones(filter),
        )
        .await?;
        let zone = select_single(zones, NAMES, "Error reading trust zone", |_| true)?;
        Ok(settle(zone, None, None))
    }
}
