//! Service abstractions for the Connect API.
//!
//! One trait per remote service, so reconcilers depend only on the calls
//! they make and tests can substitute in-memory implementations. The
//! [`grpc`] module holds the real implementation.

pub mod grpc;

use crate::error::Result;
use crate::proto::ap_binding::list_ap_bindings_request;
use crate::proto::attestation_policy::list_attestation_policies_request;
use crate::proto::cluster::list_clusters_request;
use crate::proto::federation::list_federations_request;
use crate::proto::organization::list_organizations_request;
use crate::proto::role_binding::list_role_bindings_request;
use crate::proto::trust_zone::list_trust_zones_request;
use crate::proto::{
    ApBinding, AttestationPolicy, Cluster, Federation, Organization, RoleBinding, TrustZone,
};
use async_trait::async_trait;

/// Filter for [`TrustZoneApi::list_trust_zones`].
pub type TrustZoneFilter = list_trust_zones_request::Filter;
/// Filter for [`ClusterApi::list_clusters`].
pub type ClusterFilter = list_clusters_request::Filter;
/// Filter for [`FederationApi::list_federations`].
pub type FederationFilter = list_federations_request::Filter;
/// Filter for [`ApBindingApi::list_ap_bindings`].
pub type ApBindingFilter = list_ap_bindings_request::Filter;
/// Filter for [`AttestationPolicyApi::list_attestation_policies`].
pub type AttestationPolicyFilter = list_attestation_policies_request::Filter;
/// Filter for [`RoleBindingApi::list_role_bindings`].
pub type RoleBindingFilter = list_role_bindings_request::Filter;
/// Filter for [`OrganizationApi::list_organizations`].
pub type OrganizationFilter = list_organizations_request::Filter;

/// Trust zone service.
#[async_trait]
pub trait TrustZoneApi: Send + Sync {
    /// Create a trust zone and return it as stored.
    async fn create_trust_zone(&self, trust_zone: TrustZone) -> Result<TrustZone>;

    /// Fetch a trust zone by id.
    async fn get_trust_zone(&self, id: &str) -> Result<TrustZone>;

    /// List trust zones matching `filter`.
    async fn list_trust_zones(&self, filter: TrustZoneFilter) -> Result<Vec<TrustZone>>;

    /// Replace a trust zone.
    async fn update_trust_zone(&self, trust_zone: TrustZone) -> Result<TrustZone>;

    /// Delete a trust zone.
    async fn destroy_trust_zone(&self, id: &str) -> Result<()>;
}

/// Cluster service.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Create a cluster and return it as stored.
    async fn create_cluster(&self, cluster: Cluster) -> Result<Cluster>;

    /// Fetch a cluster by id.
    async fn get_cluster(&self, id: &str) -> Result<Cluster>;

    /// List clusters matching `filter`.
    async fn list_clusters(&self, filter: ClusterFilter) -> Result<Vec<Cluster>>;

    /// Replace a cluster.
    async fn update_cluster(&self, cluster: Cluster) -> Result<Cluster>;

    /// Delete a cluster.
    async fn destroy_cluster(&self, id: &str) -> Result<()>;
}

/// Federation service. Federations cannot be updated.
#[async_trait]
pub trait FederationApi: Send + Sync {
    /// Create a federation and return it as stored.
    async fn create_federation(&self, federation: Federation) -> Result<Federation>;

    /// Fetch a federation by id.
    async fn get_federation(&self, id: &str) -> Result<Federation>;

    /// List federations matching `filter`.
    async fn list_federations(&self, filter: FederationFilter) -> Result<Vec<Federation>>;

    /// Delete a federation.
    async fn destroy_federation(&self, id: &str) -> Result<()>;
}

/// Attestation policy service.
#[async_trait]
pub trait AttestationPolicyApi: Send + Sync {
    /// Create a policy and return it as stored.
    async fn create_attestation_policy(
        &self,
        policy: AttestationPolicy,
    ) -> Result<AttestationPolicy>;

    /// Fetch a policy by id.
    async fn get_attestation_policy(&self, id: &str) -> Result<AttestationPolicy>;

    /// List policies matching `filter`.
    async fn list_attestation_policies(
        &self,
        filter: AttestationPolicyFilter,
    ) -> Result<Vec<AttestationPolicy>>;

    /// Replace a policy.
    async fn update_attestation_policy(
        &self,
        policy: AttestationPolicy,
    ) -> Result<AttestationPolicy>;

    /// Delete a policy.
    async fn destroy_attestation_policy(&self, id: &str) -> Result<()>;
}

/// Attestation policy binding service. There is no get-by-id call.
#[async_trait]
pub trait ApBindingApi: Send + Sync {
    /// Create a binding and return it as stored.
    async fn create_ap_binding(&self, binding: ApBinding) -> Result<ApBinding>;

    /// List bindings matching `filter`.
    async fn list_ap_bindings(&self, filter: ApBindingFilter) -> Result<Vec<ApBinding>>;

    /// Replace a binding.
    async fn update_ap_binding(&self, binding: ApBinding) -> Result<ApBinding>;

    /// Delete a binding.
    async fn destroy_ap_binding(&self, id: &str) -> Result<()>;
}

/// Role binding service.
#[async_trait]
pub trait RoleBindingApi: Send + Sync {
    /// Create a role binding and return it as stored.
    async fn create_role_binding(&self, binding: RoleBinding) -> Result<RoleBinding>;

    /// Fetch a role binding by id.
    async fn get_role_binding(&self, id: &str) -> Result<RoleBinding>;

    /// List role bindings matching `filter`.
    async fn list_role_bindings(&self, filter: RoleBindingFilter) -> Result<Vec<RoleBinding>>;

    /// Replace a role binding.
    async fn update_role_binding(&self, binding: RoleBinding) -> Result<RoleBinding>;

    /// Delete a role binding.
    async fn destroy_role_binding(&self, id: &str) -> Result<()>;
}

/// Organization service (read only).
#[async_trait]
pub trait OrganizationApi: Send + Sync {
    /// List organizations matching `filter`.
    async fn list_organizations(&self, filter: OrganizationFilter) -> Result<Vec<Organization>>;
}

/// Every Connect service at once.
///
/// Implemented automatically for any type implementing all service traits.
pub trait ConnectApi:
    TrustZoneApi
    + ClusterApi
    + FederationApi
    + AttestationPolicyApi
    + ApBindingApi
    + RoleBindingApi
    + OrganizationApi
{
}

impl<T> ConnectApi for T where
    T: TrustZoneApi
        + ClusterApi
        + FederationApi
        + AttestationPolicyApi
        + ApBindingApi
        + RoleBindingApi
        + OrganizationApi
{
}
