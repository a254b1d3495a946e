//! TLS client configuration for https gateways.

use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use thiserror::Error;
use tokio_rustls::TlsConnector;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("no system root certificates found")]
    NoRootCertificates,

    #[error("TLS configuration error: {0}")]
    Config(#[from] rustls::Error),

    #[error("invalid server name: {0}")]
    ServerName(String),
}

/// Create a TLS connector verifying gateways against the system roots.
///
/// ALPN is pinned to HTTP/1.1 because gateway connections are driven by the
/// HTTP/1 client handshake.
pub fn create_tls_connector() -> Result<TlsConnector, TlsError> {
    let mut root_store = RootCertStore::empty();

    let native_certs = rustls_native_certs::load_native_certs();
    for err in native_certs.errors {
        tracing::debug!(error = %err, "Skipping unreadable native certificate");
    }
    for cert in native_certs.certs {
        if let Err(e) = root_store.add(cert) {
            tracing::debug!(error = %e, "Skipping invalid native certificate");
        }
    }

    if root_store.is_empty() {
        return Err(TlsError::NoRootCertificates);
    }

    tracing::debug!(roots = root_store.len(), "Loaded root certificates");

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_root_certificates(root_store)
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Convert a gateway host to a TLS server name.
pub fn server_name(host: &str) -> Result<ServerName<'static>, TlsError> {
    ServerName::try_from(host.to_string()).map_err(|_| TlsError::ServerName(host.to_string()))
}
