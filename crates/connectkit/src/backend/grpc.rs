//! gRPC backend over a single shared HTTP/2 channel.

use super::{
    ApBindingApi, ApBindingFilter, AttestationPolicyApi, AttestationPolicyFilter, ClusterApi,
    ClusterFilter, FederationApi, FederationFilter, OrganizationApi, OrganizationFilter,
    RoleBindingApi, RoleBindingFilter, TrustZoneApi, TrustZoneFilter,
};
use crate::auth::{BearerInterceptor, TokenSource};
use crate::error::{Error, Result};
use crate::proto::ap_binding::{
    CreateApBindingRequest, CreateApBindingResponse, DestroyApBindingRequest,
    DestroyApBindingResponse, ListApBindingsRequest, ListApBindingsResponse,
    UpdateApBindingRequest, UpdateApBindingResponse,
};
use crate::proto::attestation_policy::{
    CreateAttestationPolicyRequest, CreateAttestationPolicyResponse,
    DestroyAttestationPolicyRequest, DestroyAttestationPolicyResponse,
    GetAttestationPolicyRequest, GetAttestationPolicyResponse, ListAttestationPoliciesRequest,
    ListAttestationPoliciesResponse, UpdateAttestationPolicyRequest,
    UpdateAttestationPolicyResponse,
};
use crate::proto::cluster::{
    CreateClusterRequest, CreateClusterResponse, DestroyClusterRequest, DestroyClusterResponse,
    GetClusterRequest, GetClusterResponse, ListClustersRequest, ListClustersResponse,
    UpdateClusterRequest, UpdateClusterResponse,
};
use crate::proto::federation::{
    CreateFederationRequest, CreateFederationResponse, DestroyFederationRequest,
    DestroyFederationResponse, GetFederationRequest, GetFederationResponse,
    ListFederationsRequest, ListFederationsResponse,
};
use crate::proto::organization::{ListOrganizationsRequest, ListOrganizationsResponse};
use crate::proto::role_binding::{
    CreateRoleBindingRequest, CreateRoleBindingResponse, DestroyRoleBindingRequest,
    DestroyRoleBindingResponse, GetRoleBindingRequest, GetRoleBindingResponse,
    ListRoleBindingsRequest, ListRoleBindingsResponse, UpdateRoleBindingRequest,
    UpdateRoleBindingResponse,
};
use crate::proto::trust_zone::{
    CreateTrustZoneRequest, CreateTrustZoneResponse, DestroyTrustZoneRequest,
    DestroyTrustZoneResponse, GetTrustZoneRequest, GetTrustZoneResponse, ListTrustZonesRequest,
    ListTrustZonesResponse, UpdateTrustZoneRequest, UpdateTrustZoneResponse,
};
use crate::proto::{
    ApBinding, AttestationPolicy, Cluster, Federation, Organization, RoleBinding, TrustZone,
};
use crate::retry::{self, LogCallback};
use crate::tls::{self, ServerAddress};
use crate::types::{ConnectConfig, RetryConfig};
use async_trait::async_trait;
use http::uri::PathAndQuery;
use hyper_rustls::HttpsConnectorBuilder;
use std::sync::Arc;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::{Channel, Endpoint};

const TRUST_ZONE_SERVICE: &str = "proto.connect.trust_zone_service.v1alpha1.TrustZoneService";
const CLUSTER_SERVICE: &str = "proto.connect.cluster_service.v1alpha1.ClusterService";
const FEDERATION_SERVICE: &str = "proto.connect.federation_service.v1alpha1.FederationService";
const ATTESTATION_POLICY_SERVICE: &str =
    "proto.connect.attestation_policy_service.v1alpha1.AttestationPolicyService";
const AP_BINDING_SERVICE: &str = "proto.connect.ap_binding_service.v1alpha1.APBindingService";
const ROLE_BINDING_SERVICE: &str =
    "proto.connect.role_binding_service.v1alpha1.RoleBindingService";
const ORGANIZATION_SERVICE: &str =
    "proto.connect.organization_service.v1alpha1.OrganizationService";

type AuthChannel = InterceptedService<Channel, BearerInterceptor>;

/// Connect API client speaking gRPC.
///
/// Cloning is cheap; all clones share one channel.
#[derive(Clone)]
pub struct GrpcBackend {
    grpc: Grpc<AuthChannel>,
    retry: RetryConfig,
}

impl GrpcBackend {
    /// Open a lazily-connected channel to the configured server.
    ///
    /// Endpoint and TLS problems are reported here; network failures surface
    /// on the first call. Must be called from within a Tokio runtime.
    pub fn connect(config: &ConnectConfig, token: Arc<dyn TokenSource>) -> Result<Self> {
        let address = ServerAddress::parse(&config.endpoint)?;
        let tls_config = tls::client_config(config.trust_policy)?;

        log::info!(
            "Connecting to Connect gRPC server at {} (authority {})",
            config.endpoint,
            address.authority()
        );

        let connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_only()
            .enable_http2()
            .build();

        let uri = address.uri();
        let channel = Endpoint::from_shared(uri.clone())
            .map_err(|e| Error::InvalidEndpoint {
                endpoint: uri,
                reason: e.to_string(),
            })?
            .user_agent(config.user_agent.clone())?
            .connect_with_connector_lazy(connector);

        Ok(Self::from_channel(channel, token, config.retry.clone()))
    }

    /// Wrap an existing channel.
    pub fn from_channel(channel: Channel, token: Arc<dyn TokenSource>, retry: RetryConfig) -> Self {
        let service = InterceptedService::new(channel, BearerInterceptor::new(token));
        Self {
            grpc: Grpc::new(service),
            retry,
        }
    }

    async fn unary<Req, Resp>(&self, service: &str, method: &str, request: Req) -> Result<Resp>
    where
        Req: prost::Message + Clone + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let path = PathAndQuery::try_from(format!("/{service}/{method}")).map_err(|e| {
            Error::InvalidEndpoint {
                endpoint: format!("/{service}/{method}"),
                reason: e.to_string(),
            }
        })?;

        retry::with_retry(&self.retry, Some(&LogCallback), || {
            let mut grpc = self.grpc.clone();
            let request = request.clone();
            let path = path.clone();
            async move {
                log::debug!("Calling {path}");
                grpc.ready().await.map_err(|e| {
                    tonic::Status::unavailable(format!("Service was not ready: {e}"))
                })?;
                let response = grpc
                    .unary(
                        tonic::Request::new(request),
                        path,
                        ProstCodec::<Req, Resp>::default(),
                    )
                    .await?;
                Ok(response.into_inner())
            }
        })
        .await
    }
}

fn required<T>(value: Option<T>, method: &'static str, field: &'static str) -> Result<T> {
    value.ok_or(Error::MissingField { method, field })
}

#[async_trait]
impl TrustZoneApi for GrpcBackend {
    async fn create_trust_zone(&self, trust_zone: TrustZone) -> Result<TrustZone> {
        let request = CreateTrustZoneRequest {
            trust_zone: Some(trust_zone),
        };
        let response: CreateTrustZoneResponse = self
            .unary(TRUST_ZONE_SERVICE, "CreateTrustZone", request)
            .await?;
        required(response.trust_zone, "CreateTrustZone", "trust_zone")
    }

    async fn get_trust_zone(&self, id: &str) -> Result<TrustZone> {
        let request = GetTrustZoneRequest {
            trust_zone_id: Some(id.to_string()),
        };
        let response: GetTrustZoneResponse = self
            .unary(TRUST_ZONE_SERVICE, "GetTrustZone", request)
            .await?;
        required(response.trust_zone, "GetTrustZone", "trust_zone")
    }

    async fn list_trust_zones(&self, filter: TrustZoneFilter) -> Result<Vec<TrustZone>> {
        let request = ListTrustZonesRequest {
            filter: Some(filter),
        };
        let response: ListTrustZonesResponse = self
            .unary(TRUST_ZONE_SERVICE, "ListTrustZones", request)
            .await?;
        Ok(response.trust_zones)
    }

    async fn update_trust_zone(&self, trust_zone: TrustZone) -> Result<TrustZone> {
        let request = UpdateTrustZoneRequest {
            trust_zone: Some(trust_zone),
        };
        let response: UpdateTrustZoneResponse = self
            .unary(TRUST_ZONE_SERVICE, "UpdateTrustZone", request)
            .await?;
        required(response.trust_zone, "UpdateTrustZone", "trust_zone")
    }

    async fn destroy_trust_zone(&self, id: &str) -> Result<()> {
        let request = DestroyTrustZoneRequest {
            trust_zone_id: Some(id.to_string()),
        };
        let _: DestroyTrustZoneResponse = self
            .unary(TRUST_ZONE_SERVICE, "DestroyTrustZone", request)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ClusterApi for GrpcBackend {
    async fn create_cluster(&self, cluster: Cluster) -> Result<Cluster> {
        let request = CreateClusterRequest {
            cluster: Some(cluster),
        };
        let response: CreateClusterResponse = self
            .unary(CLUSTER_SERVICE, "CreateCluster", request)
            .await?;
        required(response.cluster, "CreateCluster", "cluster")
    }

    async fn get_cluster(&self, id: &str) -> Result<Cluster> {
        let request = GetClusterRequest {
            cluster_id: Some(id.to_string()),
        };
        let response: GetClusterResponse =
            self.unary(CLUSTER_SERVICE, "GetCluster", request).await?;
        required(response.cluster, "GetCluster", "cluster")
    }

    async fn list_clusters(&self, filter: ClusterFilter) -> Result<Vec<Cluster>> {
        let request = ListClustersRequest {
            filter: Some(filter),
        };
        let response: ListClustersResponse =
            self.unary(CLUSTER_SERVICE, "ListClusters", request).await?;
        Ok(response.clusters)
    }

    async fn update_cluster(&self, cluster: Cluster) -> Result<Cluster> {
        let request = UpdateClusterRequest {
            cluster: Some(cluster),
        };
        let response: UpdateClusterResponse = self
            .unary(CLUSTER_SERVICE, "UpdateCluster", request)
            .await?;
        required(response.cluster, "UpdateCluster", "cluster")
    }

    async fn destroy_cluster(&self, id: &str) -> Result<()> {
        let request = DestroyClusterRequest {
            cluster_id: Some(id.to_string()),
        };
        let _: DestroyClusterResponse = self
            .unary(CLUSTER_SERVICE, "DestroyCluster", request)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FederationApi for GrpcBackend {
    async fn create_federation(&self, federation: Federation) -> Result<Federation> {
        let request = CreateFederationRequest {
            federation: Some(federation),
        };
        let response: CreateFederationResponse = self
            .unary(FEDERATION_SERVICE, "CreateFederation", request)
            .await?;
        required(response.federation, "CreateFederation", "federation")
    }

    async fn get_federation(&self, id: &str) -> Result<Federation> {
        let request = GetFederationRequest {
            federation_id: Some(id.to_string()),
        };
        let response: GetFederationResponse = self
            .unary(FEDERATION_SERVICE, "GetFederation", request)
            .await?;
        required(response.federation, "GetFederation", "federation")
    }

    async fn list_federations(&self, filter: FederationFilter) -> Result<Vec<Federation>> {
        let request = ListFederationsRequest {
            filter: Some(filter),
        };
        let response: ListFederationsResponse = self
            .unary(FEDERATION_SERVICE, "ListFederations", request)
            .await?;
        Ok(response.federations)
    }

    async fn destroy_federation(&self, id: &str) -> Result<()> {
        let request = DestroyFederationRequest {
            federation_id: Some(id.to_string()),
        };
        let _: DestroyFederationResponse = self
            .unary(FEDERATION_SERVICE, "DestroyFederation", request)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AttestationPolicyApi for GrpcBackend {
    async fn create_attestation_policy(
        &self,
        policy: AttestationPolicy,
    ) -> Result<AttestationPolicy> {
        let request = CreateAttestationPolicyRequest {
            policy: Some(policy),
        };
        let response: CreateAttestationPolicyResponse = self
            .unary(ATTESTATION_POLICY_SERVICE, "CreateAttestationPolicy", request)
            .await?;
        required(response.policy, "CreateAttestationPolicy", "policy")
    }

    async fn get_attestation_policy(&self, id: &str) -> Result<AttestationPolicy> {
        let request = GetAttestationPolicyRequest {
            policy_id: Some(id.to_string()),
        };
        let response: GetAttestationPolicyResponse = self
            .unary(ATTESTATION_POLICY_SERVICE, "GetAttestationPolicy", request)
            .await?;
        required(response.policy, "GetAttestationPolicy", "policy")
    }

    async fn list_attestation_policies(
        &self,
        filter: AttestationPolicyFilter,
    ) -> Result<Vec<AttestationPolicy>> {
        let request = ListAttestationPoliciesRequest {
            filter: Some(filter),
        };
        let response: ListAttestationPoliciesResponse = self
            .unary(ATTESTATION_POLICY_SERVICE, "ListAttestationPolicies", request)
            .await?;
        Ok(response.policies)
    }

    async fn update_attestation_policy(
        &self,
        policy: AttestationPolicy,
    ) -> Result<AttestationPolicy> {
        let request = UpdateAttestationPolicyRequest {
            policy: Some(policy),
        };
        let response: UpdateAttestationPolicyResponse = self
            .unary(ATTESTATION_POLICY_SERVICE, "UpdateAttestationPolicy", request)
            .await?;
        required(response.policy, "UpdateAttestationPolicy", "policy")
    }

    async fn destroy_attestation_policy(&self, id: &str) -> Result<()> {
        let request = DestroyAttestationPolicyRequest {
            policy_id: Some(id.to_string()),
        };
        let _: DestroyAttestationPolicyResponse = self
            .unary(ATTESTATION_POLICY_SERVICE, "DestroyAttestationPolicy", request)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ApBindingApi for GrpcBackend {
    async fn create_ap_binding(&self, binding: ApBinding) -> Result<ApBinding> {
        let request = CreateApBindingRequest {
            binding: Some(binding),
        };
        let response: CreateApBindingResponse = self
            .unary(AP_BINDING_SERVICE, "CreateAPBinding", request)
            .await?;
        required(response.binding, "CreateAPBinding", "binding")
    }

    async fn list_ap_bindings(&self, filter: ApBindingFilter) -> Result<Vec<ApBinding>> {
        let request = ListApBindingsRequest {
            filter: Some(filter),
        };
        let response: ListApBindingsResponse = self
            .unary(AP_BINDING_SERVICE, "ListAPBindings", request)
            .await?;
        Ok(response.bindings)
    }

    async fn update_ap_binding(&self, binding: ApBinding) -> Result<ApBinding> {
        let request = UpdateApBindingRequest {
            binding: Some(binding),
        };
        let response: UpdateApBindingResponse = self
            .unary(AP_BINDING_SERVICE, "UpdateAPBinding", request)
            .await?;
        required(response.binding, "UpdateAPBinding", "binding")
    }

    async fn destroy_ap_binding(&self, id: &str) -> Result<()> {
        let request = DestroyApBindingRequest {
            binding_id: Some(id.to_string()),
        };
        let _: DestroyApBindingResponse = self
            .unary(AP_BINDING_SERVICE, "DestroyAPBinding", request)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RoleBindingApi for GrpcBackend {
    async fn create_role_binding(&self, binding: RoleBinding) -> Result<RoleBinding> {
        let request = CreateRoleBindingRequest {
            binding: Some(binding),
        };
        let response: CreateRoleBindingResponse = self
            .unary(ROLE_BINDING_SERVICE, "CreateRoleBinding", request)
            .await?;
        required(response.binding, "CreateRoleBinding", "binding")
    }

    async fn get_role_binding(&self, id: &str) -> Result<RoleBinding> {
        let request = GetRoleBindingRequest { id: id.to_string() };
        let response: GetRoleBindingResponse = self
            .unary(ROLE_BINDING_SERVICE, "GetRoleBinding", request)
            .await?;
        required(response.binding, "GetRoleBinding", "binding")
    }

    async fn list_role_bindings(&self, filter: RoleBindingFilter) -> Result<Vec<RoleBinding>> {
        let request = ListRoleBindingsRequest {
            filter: Some(filter),
        };
        let response: ListRoleBindingsResponse = self
            .unary(ROLE_BINDING_SERVICE, "ListRoleBindings", request)
            .await?;
        Ok(response.bindings)
    }

    async fn update_role_binding(&self, binding: RoleBinding) -> Result<RoleBinding> {
        let request = UpdateRoleBindingRequest {
            binding: Some(binding),
        };
        let response: UpdateRoleBindingResponse = self
            .unary(ROLE_BINDING_SERVICE, "UpdateRoleBinding", request)
            .await?;
        required(response.binding, "UpdateRoleBinding", "binding")
    }

    async fn destroy_role_binding(&self, id: &str) -> Result<()> {
        let request = DestroyRoleBindingRequest { id: id.to_string() };
        let _: DestroyRoleBindingResponse = self
            .unary(ROLE_BINDING_SERVICE, "DestroyRoleBinding", request)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrganizationApi for GrpcBackend {
    async fn list_organizations(&self, filter: OrganizationFilter) -> Result<Vec<Organization>> {
        let request = ListOrganizationsRequest {
            filter: Some(filter),
        };
        let response: ListOrganizationsResponse = self
            .unary(ORGANIZATION_SERVICE, "ListOrganizations", request)
            .await?;
        Ok(response.organizations)
    }
}
