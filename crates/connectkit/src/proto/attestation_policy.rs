//! `proto.connect.attestation_policy_service.v1alpha1`

use std::collections::BTreeMap;

/// Rules deciding which workloads receive an identity.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttestationPolicy {
    #[prost(string, optional, tag = "1")]
    pub id: Option<String>,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, optional, tag = "3")]
    pub org_id: Option<String>,
    #[prost(oneof = "attestation_policy::Policy", tags = "4, 5, 6")]
    pub policy: Option<attestation_policy::Policy>,
}

pub mod attestation_policy {
    /// The policy body; exactly one kind per policy.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Policy {
        #[prost(message, tag = "4")]
        Kubernetes(super::ApKubernetes),
        #[prost(message, tag = "5")]
        Static(super::ApStatic),
        #[prost(message, tag = "6")]
        TpmNode(super::ApTpmNode),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApKubernetes {
    #[prost(message, optional, tag = "1")]
    pub namespace_selector: Option<ApLabelSelector>,
    #[prost(message, optional, tag = "2")]
    pub pod_selector: Option<ApLabelSelector>,
    #[prost(string, repeated, tag = "3")]
    pub dns_name_templates: Vec<String>,
    #[prost(string, optional, tag = "4")]
    pub spiffe_id_path_template: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApLabelSelector {
    #[prost(btree_map = "string, string", tag = "1")]
    pub match_labels: BTreeMap<String, String>,
    #[prost(message, repeated, tag = "2")]
    pub match_expressions: Vec<ApMatchExpression>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApMatchExpression {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(string, tag = "2")]
    pub operator: String,
    #[prost(string, repeated, tag = "3")]
    pub values: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApStatic {
    #[prost(string, optional, tag = "1")]
    pub spiffe_id_path: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub parent_id_path: Option<String>,
    #[prost(message, repeated, tag = "3")]
    pub selectors: Vec<Selector>,
    #[prost(string, repeated, tag = "4")]
    pub dns_names: Vec<String>,
}

/// SPIRE workload selector.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Selector {
    #[prost(string, tag = "1")]
    pub r#type: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApTpmNode {
    #[prost(message, optional, tag = "1")]
    pub attestation: Option<TpmAttestation>,
    #[prost(string, repeated, tag = "2")]
    pub selector_values: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TpmAttestation {
    #[prost(string, optional, tag = "1")]
    pub ek_hash: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateAttestationPolicyRequest {
    #[prost(message, optional, tag = "1")]
    pub policy: Option<AttestationPolicy>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateAttestationPolicyResponse {
    #[prost(message, optional, tag = "1")]
    pub policy: Option<AttestationPolicy>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetAttestationPolicyRequest {
    #[prost(string, optional, tag = "1")]
    pub policy_id: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetAttestationPolicyResponse {
    #[prost(message, optional, tag = "1")]
    pub policy: Option<AttestationPolicy>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListAttestationPoliciesRequest {
    #[prost(message, optional, tag = "1")]
    pub filter: Option<list_attestation_policies_request::Filter>,
}

pub mod list_attestation_policies_request {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Filter {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub org_id: Option<String>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListAttestationPoliciesResponse {
    #[prost(message, repeated, tag = "1")]
    pub policies: Vec<AttestationPolicy>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateAttestationPolicyRequest {
    #[prost(message, optional, tag = "1")]
    pub policy: Option<AttestationPolicy>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateAttestationPolicyResponse {
    #[prost(message, optional, tag = "1")]
    pub policy: Option<AttestationPolicy>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DestroyAttestationPolicyRequest {
    #[prost(string, optional, tag = "1")]
    pub policy_id: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DestroyAttestationPolicyResponse {}
