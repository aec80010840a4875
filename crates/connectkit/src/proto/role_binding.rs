//! `proto.connect.role_binding_service.v1alpha1`

/// Grants a role on a resource to a user or group.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RoleBinding {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub role_id: String,
    #[prost(oneof = "role_binding::Principal", tags = "3, 4")]
    pub principal: Option<role_binding::Principal>,
    #[prost(message, optional, tag = "5")]
    pub resource: Option<Resource>,
}

pub mod role_binding {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Principal {
        #[prost(message, tag = "3")]
        User(super::User),
        #[prost(message, tag = "4")]
        Group(super::Group),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct User {
    #[prost(string, tag = "1")]
    pub subject: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Group {
    #[prost(string, tag = "1")]
    pub claim_value: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Resource {
    #[prost(string, tag = "1")]
    pub r#type: String,
    #[prost(string, tag = "2")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateRoleBindingRequest {
    #[prost(message, optional, tag = "1")]
    pub binding: Option<RoleBinding>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateRoleBindingResponse {
    #[prost(message, optional, tag = "1")]
    pub binding: Option<RoleBinding>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRoleBindingRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRoleBindingResponse {
    #[prost(message, optional, tag = "1")]
    pub binding: Option<RoleBinding>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListRoleBindingsRequest {
    #[prost(message, optional, tag = "1")]
    pub filter: Option<list_role_bindings_request::Filter>,
}

pub mod list_role_bindings_request {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Filter {
        #[prost(string, optional, tag = "1")]
        pub role_id: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub resource_type: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub resource_id: Option<String>,
        #[prost(string, optional, tag = "4")]
        pub user_subject: Option<String>,
        #[prost(string, optional, tag = "5")]
        pub group_claim_value: Option<String>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListRoleBindingsResponse {
    #[prost(message, repeated, tag = "1")]
    pub bindings: Vec<RoleBinding>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateRoleBindingRequest {
    #[prost(message, optional, tag = "1")]
    pub binding: Option<RoleBinding>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateRoleBindingResponse {
    #[prost(message, optional, tag = "1")]
    pub binding: Option<RoleBinding>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DestroyRoleBindingRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DestroyRoleBindingResponse {}
