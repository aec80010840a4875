//! Endpoint parsing and TLS trust configuration.

use crate::error::{Error, Result};
use crate::types::{SERVER_AUTHORITY_SUBDOMAIN, TrustPolicy};
use rustls::ClientConfig;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;

/// Host and port of the control plane, plus the authority derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    /// Host as configured (IPv6 addresses keep their brackets)
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl ServerAddress {
    /// Parse a `host:port` endpoint.
    pub fn parse(endpoint: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        let authority: http::uri::Authority = endpoint
            .parse()
            .map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;
        if authority.as_str().contains('@') {
            return Err(invalid("user info is not allowed"));
        }
        let port = authority
            .port_u16()
            .ok_or_else(|| invalid("missing port"))?;
        let host = authority.host();
        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Virtual authority used for `:authority` and TLS SNI.
    pub fn authority(&self) -> String {
        format!("{SERVER_AUTHORITY_SUBDOMAIN}.{}", self.host)
    }

    /// URI the channel connects to.
    pub fn uri(&self) -> String {
        format!("https://{}:{}", self.authority(), self.port)
    }
}

/// Derive the server authority (`connect.<host>`) from a `host:port` endpoint.
pub fn server_authority(endpoint: &str) -> Result<String> {
    Ok(ServerAddress::parse(endpoint)?.authority())
}

/// Build the rustls client configuration for a trust policy.
pub fn client_config(policy: TrustPolicy) -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder =
        ClientConfig::builder_with_provider(provider.clone()).with_safe_default_protocol_versions()?;

    let config = match policy {
        TrustPolicy::VerifySystemRoots => builder
            .with_root_certificates(system_roots()?)
            .with_no_client_auth(),
        TrustPolicy::SkipVerify => {
            log::warn!("TLS certificate verification is disabled");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(SkipServerVerification(provider)))
                .with_no_client_auth()
        }
    };

    Ok(config)
}

fn system_roots() -> Result<RootCertStore> {
    let loaded = rustls_native_certs::load_native_certs();
    for error in &loaded.errors {
        log::debug!("Skipping native certificate source: {error}");
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
    log::debug!("Loaded {added} system root certificates ({ignored} ignored)");

    if roots.is_empty() {
        return Err(Error::RootStore(
            "the system root certificate store is empty or unreadable".to_string(),
        ));
    }
    Ok(roots)
}

/// Certificate verifier that accepts any server certificate.
///
/// Handshake signatures are still checked so the session keys belong to
/// whoever presented the certificate.
#[derive(Debug)]
struct SkipServerVerification(Arc<CryptoProvider>);

impl ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_authority() {
        assert_eq!(
            server_authority("cofide.example.com:443").unwrap(),
            "connect.cofide.example.com"
        );
        assert_eq!(server_authority("localhost:8443").unwrap(), "connect.localhost");
    }

    #[test]
    fn test_server_address_uri() {
        let address = ServerAddress::parse("api.example.com:8443").unwrap();
        assert_eq!(address.port, 8443);
        assert_eq!(address.uri(), "https://connect.api.example.com:8443");
    }

    #[test]
    fn test_ipv6_endpoint() {
        let address = ServerAddress::parse("[::1]:443").unwrap();
        assert_eq!(address.host, "[::1]");
        assert_eq!(address.port, 443);
    }

    #[test]
    fn test_missing_port_rejected() {
        let err = ServerAddress::parse("api.example.com").unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint { .. }));
        assert!(err.to_string().contains("missing port"));
    }

    #[test]
    fn test_malformed_endpoints_rejected() {
        assert!(ServerAddress::parse("").is_err());
        assert!(ServerAddress::parse("host:notaport").is_err());
        assert!(ServerAddress::parse("user@host:443").is_err());
        assert!(ServerAddress::parse("https://host:443/path").is_err());
    }

    #[test]
    fn test_skip_verify_config() {
        let config = client_config(TrustPolicy::SkipVerify).unwrap();
        assert!(config.alpn_protocols.is_empty());
    }
}
