//! `proto.connect.trust_zone_service.v1alpha1`

/// A SPIFFE trust zone.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TrustZone {
    #[prost(string, optional, tag = "1")]
    pub id: Option<String>,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub trust_domain: String,
    #[prost(string, optional, tag = "4")]
    pub org_id: Option<String>,
    #[prost(bool, tag = "5")]
    pub is_management_zone: bool,
    #[prost(string, tag = "6")]
    pub bundle_endpoint_url: String,
    #[prost(enumeration = "BundleEndpointProfile", tag = "7")]
    pub bundle_endpoint_profile: i32,
    #[prost(string, tag = "8")]
    pub jwt_issuer: String,
}

/// SPIFFE bundle endpoint profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum BundleEndpointProfile {
    Unspecified = 0,
    HttpsSpiffe = 1,
    HttpsWeb = 2,
}

impl BundleEndpointProfile {
    /// Schema name of the value.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "BUNDLE_ENDPOINT_PROFILE_UNSPECIFIED",
            Self::HttpsSpiffe => "BUNDLE_ENDPOINT_PROFILE_HTTPS_SPIFFE",
            Self::HttpsWeb => "BUNDLE_ENDPOINT_PROFILE_HTTPS_WEB",
        }
    }

    /// Parse a schema name.
    pub fn from_str_name(value: &str) -> Option<Self> {
        match value {
            "BUNDLE_ENDPOINT_PROFILE_UNSPECIFIED" => Some(Self::Unspecified),
            "BUNDLE_ENDPOINT_PROFILE_HTTPS_SPIFFE" => Some(Self::HttpsSpiffe),
            "BUNDLE_ENDPOINT_PROFILE_HTTPS_WEB" => Some(Self::HttpsWeb),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateTrustZoneRequest {
    #[prost(message, optional, tag = "1")]
    pub trust_zone: Option<TrustZone>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateTrustZoneResponse {
    #[prost(message, optional, tag = "1")]
    pub trust_zone: Option<TrustZone>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTrustZoneRequest {
    #[prost(string, optional, tag = "1")]
    pub trust_zone_id: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTrustZoneResponse {
    #[prost(message, optional, tag = "1")]
    pub trust_zone: Option<TrustZone>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListTrustZonesRequest {
    #[prost(message, optional, tag = "1")]
    pub filter: Option<list_trust_zones_request::Filter>,
}

pub mod list_trust_zones_request {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Filter {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub org_id: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub trust_domain: Option<String>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListTrustZonesResponse {
    #[prost(message, repeated, tag = "1")]
    pub trust_zones: Vec<TrustZone>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateTrustZoneRequest {
    #[prost(message, optional, tag = "1")]
    pub trust_zone: Option<TrustZone>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateTrustZoneResponse {
    #[prost(message, optional, tag = "1")]
    pub trust_zone: Option<TrustZone>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DestroyTrustZoneRequest {
    #[prost(string, optional, tag = "1")]
    pub trust_zone_id: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DestroyTrustZoneResponse {}
