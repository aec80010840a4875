//! Wire messages for the Connect v1alpha1 services.
//!
//! The messages are declared with `prost` derives so no build step is
//! needed. Field numbers follow the published schema; presence-tracked
//! scalars are `Option`s.

pub mod ap_binding;
pub mod attestation_policy;
pub mod cluster;
pub mod federation;
pub mod organization;
pub mod role_binding;
pub mod trust_zone;

pub use ap_binding::{ApBinding, ApBindingFederation};
pub use attestation_policy::{
    ApKubernetes, ApLabelSelector, ApMatchExpression, ApStatic, ApTpmNode, AttestationPolicy,
    Selector, TpmAttestation,
};
pub use cluster::{Cluster, TrustProvider};
pub use federation::Federation;
pub use organization::Organization;
pub use role_binding::{Group, Resource, RoleBinding, User};
pub use trust_zone::{BundleEndpointProfile, TrustZone};
