//! `proto.connect.ap_binding_service.v1alpha1`
//!
//! The service has no get-by-id method; callers list with a filter.

/// Binds an attestation policy to a trust zone.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApBinding {
    #[prost(string, optional, tag = "1")]
    pub id: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub org_id: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub trust_zone_id: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub policy_id: Option<String>,
    #[prost(message, repeated, tag = "5")]
    pub federations: Vec<ApBindingFederation>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApBindingFederation {
    #[prost(string, optional, tag = "1")]
    pub trust_zone_id: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateApBindingRequest {
    #[prost(message, optional, tag = "1")]
    pub binding: Option<ApBinding>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateApBindingResponse {
    #[prost(message, optional, tag = "1")]
    pub binding: Option<ApBinding>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListApBindingsRequest {
    #[prost(message, optional, tag = "1")]
    pub filter: Option<list_ap_bindings_request::Filter>,
}

pub mod list_ap_bindings_request {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Filter {
        #[prost(string, optional, tag = "1")]
        pub org_id: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub trust_zone_id: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub policy_id: Option<String>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListApBindingsResponse {
    #[prost(message, repeated, tag = "1")]
    pub bindings: Vec<ApBinding>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateApBindingRequest {
    #[prost(message, optional, tag = "1")]
    pub binding: Option<ApBinding>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateApBindingResponse {
    #[prost(message, optional, tag = "1")]
    pub binding: Option<ApBinding>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DestroyApBindingRequest {
    #[prost(string, optional, tag = "1")]
    pub binding_id: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DestroyApBindingResponse {}
