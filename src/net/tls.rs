//! TLS configuration and certificate loading.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;
use rustls::crypto::{ring, CryptoProvider};

use crate::config::TlsConfig;

/// Install ring as the process-wide rustls provider.
///
/// More than one provider is compiled in (axum-server and sqlx each enable
/// their own), so rustls cannot pick one itself.
pub fn install_crypto_provider() {
    if CryptoProvider::get_default().is_none() {
        // Losing a race to another installer is fine.
        let _ = ring::default_provider().install_default();
    }
}

/// Load the listener's rustls configuration from PEM files.
pub async fn load_tls_config(tls: &TlsConfig) -> Result<RustlsConfig, std::io::Error> {
    install_crypto_provider();

    let cert_path = Path::new(&tls.cert_path);
    let key_path = Path::new(&tls.key_path);

    for (what, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} file not found: {:?}", what, path),
            ));
        }
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}
