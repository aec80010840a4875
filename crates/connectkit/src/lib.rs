//! # connectkit
//!
//! Pure Rust client for the Connect control plane API.
//!
//! This crate provides:
//! - Wire messages for the trust zone, cluster, federation, attestation
//!   policy, policy binding, role binding and organization services
//! - One long-lived TLS channel shared by every service handle
//! - Bearer credentials looked up on every call
//! - Automatic retry of authentication races
//!
//! ## Example
//!
//! ```no_run
//! use connectkit::{Client, ConnectConfig, StaticToken, TrustPolicy};
//! use std::sync::Arc;
//!
//! # async fn run() -> connectkit::Result<()> {
//! let config = ConnectConfig::new("cofide.example.com:443", TrustPolicy::default());
//! let client = Client::connect(&config, Arc::new(StaticToken::new("token")))?;
//!
//! let zone = client.trust_zones().get_trust_zone("tz-123").await?;
//! println!("{} ({})", zone.name, zone.trust_domain);
//! # Ok(())
//! # }
//! ```
//!
//! ## Retry Logic
//!
//! Calls rejected as `UNAUTHENTICATED` are retried up to ten times with
//! exponential backoff from 100ms to 1s. Every other status is returned
//! immediately. Configure the policy with [`RetryConfig`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod backend;
pub mod error;
#[allow(missing_docs)]
pub mod proto;
pub mod retry;
pub mod tls;
pub mod types;

pub use auth::{EnvToken, StaticToken, TokenSource};
pub use backend::{
    ApBindingApi, ApBindingFilter, AttestationPolicyApi, AttestationPolicyFilter, ClusterApi,
    ClusterFilter, ConnectApi, FederationApi, FederationFilter, OrganizationApi,
    OrganizationFilter, RoleBindingApi, RoleBindingFilter, TrustZoneApi, TrustZoneFilter,
};
pub use error::{Error, ErrorCategory, Result};
pub use tonic::Code;
pub use types::{ConnectConfig, RetryConfig, SERVER_AUTHORITY_SUBDOMAIN, TrustPolicy};

use backend::grpc::GrpcBackend;
use std::sync::Arc;

/// Handles to every Connect service, sharing one backend.
///
/// Reconcilers take the handle they need from here at construction time.
#[derive(Clone)]
pub struct Client {
    trust_zones: Arc<dyn TrustZoneApi>,
    clusters: Arc<dyn ClusterApi>,
    federations: Arc<dyn FederationApi>,
    attestation_policies: Arc<dyn AttestationPolicyApi>,
    ap_bindings: Arc<dyn ApBindingApi>,
    role_bindings: Arc<dyn RoleBindingApi>,
    organizations: Arc<dyn OrganizationApi>,
}

impl Client {
    /// Connect to the server described by `config`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(config: &ConnectConfig, token: Arc<dyn TokenSource>) -> Result<Self> {
        let backend = GrpcBackend::connect(config, token)?;
        Ok(Self::with_backend(Arc::new(backend)))
    }

    /// Create a client over a custom backend (useful for testing).
    pub fn with_backend<B: ConnectApi + 'static>(backend: Arc<B>) -> Self {
        Self {
            trust_zones: backend.clone(),
            clusters: backend.clone(),
            federations: backend.clone(),
            attestation_policies: backend.clone(),
            ap_bindings: backend.clone(),
            role_bindings: backend.clone(),
            organizations: backend,
        }
    }

    /// Trust zone service.
    pub fn trust_zones(&self) -> Arc<dyn TrustZoneApi> {
        self.trust_zones.clone()
    }

    /// Cluster service.
    pub fn clusters(&self) -> Arc<dyn ClusterApi> {
        self.clusters.clone()
    }

    /// Federation service.
    pub fn federations(&self) -> Arc<dyn FederationApi> {
        self.federations.clone()
    }

    /// Attestation policy service.
    pub fn attestation_policies(&self) -> Arc<dyn AttestationPolicyApi> {
        self.attestation_policies.clone()
    }

    /// Attestation policy binding service.
    pub fn ap_bindings(&self) -> Arc<dyn ApBindingApi> {
        self.ap_bindings.clone()
    }

    /// Role binding service.
    pub fn role_bindings(&self) -> Arc<dyn RoleBindingApi> {
        self.role_bindings.clone()
    }

    /// Organization service.
    pub fn organizations(&self) -> Arc<dyn OrganizationApi> {
        self.organizations.clone()
    }
}
