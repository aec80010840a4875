//! `proto.connect.cluster_service.v1alpha1`

/// A Kubernetes cluster enrolled in a trust zone.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Cluster {
    #[prost(string, optional, tag = "1")]
    pub id: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub org_id: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub trust_zone_id: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub kubernetes_context: Option<String>,
    #[prost(message, optional, tag = "6")]
    pub trust_provider: Option<TrustProvider>,
    #[prost(message, optional, tag = "7")]
    pub extra_helm_values: Option<::prost_types::Struct>,
    #[prost(string, optional, tag = "8")]
    pub profile: Option<String>,
    #[prost(bool, optional, tag = "9")]
    pub external_server: Option<bool>,
    #[prost(string, optional, tag = "10")]
    pub oidc_issuer_url: Option<String>,
    #[prost(bytes = "vec", tag = "11")]
    pub oidc_issuer_ca_cert: Vec<u8>,
}

/// Workload attestation mechanism for a cluster.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TrustProvider {
    #[prost(string, optional, tag = "1")]
    pub kind: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateClusterRequest {
    #[prost(message, optional, tag = "1")]
    pub cluster: Option<Cluster>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateClusterResponse {
    #[prost(message, optional, tag = "1")]
    pub cluster: Option<Cluster>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetClusterRequest {
    #[prost(string, optional, tag = "1")]
    pub cluster_id: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetClusterResponse {
    #[prost(message, optional, tag = "1")]
    pub cluster: Option<Cluster>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListClustersRequest {
    #[prost(message, optional, tag = "1")]
    pub filter: Option<list_clusters_request::Filter>,
}

pub mod list_clusters_request {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Filter {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub org_id: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub trust_zone_id: Option<String>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListClustersResponse {
    #[prost(message, repeated, tag = "1")]
    pub clusters: Vec<Cluster>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateClusterRequest {
    #[prost(message, optional, tag = "1")]
    pub cluster: Option<Cluster>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateClusterResponse {
    #[prost(message, optional, tag = "1")]
    pub cluster: Option<Cluster>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DestroyClusterRequest {
    #[prost(string, optional, tag = "1")]
    pub cluster_id: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DestroyClusterResponse {}
