//! `proto.connect.organization_service.v1alpha1`

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Organization {
    #[prost(string, optional, tag = "1")]
    pub id: Option<String>,
    #[prost(string, tag = "2")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListOrganizationsRequest {
    #[prost(message, optional, tag = "1")]
    pub filter: Option<list_organizations_request::Filter>,
}

pub mod list_organizations_request {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Filter {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListOrganizationsResponse {
    #[prost(message, repeated, tag = "1")]
    pub organizations: Vec<Organization>,
}
