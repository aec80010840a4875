//! `proto.connect.federation_service.v1alpha1`
//!
//! The service has no update method.

/// A bundle-exchange relationship between two trust zones.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Federation {
    #[prost(string, optional, tag = "1")]
    pub id: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub org_id: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub trust_zone_id: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub remote_trust_zone_id: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateFederationRequest {
    #[prost(message, optional, tag = "1")]
    pub federation: Option<Federation>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateFederationResponse {
    #[prost(message, optional, tag = "1")]
    pub federation: Option<Federation>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetFederationRequest {
    #[prost(string, optional, tag = "1")]
    pub federation_id: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetFederationResponse {
    #[prost(message, optional, tag = "1")]
    pub federation: Option<Federation>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListFederationsRequest {
    #[prost(message, optional, tag = "1")]
    pub filter: Option<list_federations_request::Filter>,
}

pub mod list_federations_request {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Filter {
        #[prost(string, optional, tag = "1")]
        pub org_id: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub trust_zone_id: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub remote_trust_zone_id: Option<String>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListFederationsResponse {
    #[prost(message, repeated, tag = "1")]
    pub federations: Vec<Federation>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DestroyFederationRequest {
    #[prost(string, optional, tag = "1")]
    pub federation_id: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DestroyFederationResponse {}
