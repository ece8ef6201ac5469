//! # vpn-pki - A Private Certificate Authority for VPN Endpoints
//!
//! vpn-pki bootstraps a self-signed RSA root CA, keeps its key material in an
//! owner-only directory on disk and signs certificate signing requests (CSRs)
//! into role-scoped leaf certificates for VPN clients and servers. It is built
//! on the rustcrypto libraries (`rsa`, `x509-cert`, `der`) and exposes the CA
//! over a small axum HTTP surface.
//!
//! ## Certificate Roles
//!
//! | Role   | basicConstraints | extKeyUsage | keyUsage                          |
//! |--------|------------------|-------------|-----------------------------------|
//! | client | cA=false         | clientAuth  | digitalSignature                  |
//! | server | cA=false         | serverAuth  | digitalSignature, keyEncipherment |
//!
//! The CA certificate itself carries `cA=true` and `keyCertSign, cRLSign`.
//!
//! ## On-disk Layout
//!
//! ```text
//! pki/          (0700)
//! ├── ca.key    (0600, PKCS#8 PEM private key)
//! └── ca.crt    (0600, PEM certificate)
//! ```
//!
//! ## Quick Start
//!
//! ### Bootstrapping a CA and Signing a Request
//!
//! ```rust,no_run
//! use vpn_pki::{
//!     authority::CertificateAuthority,
//!     cert::params::DistinguishedName,
//!     config::{PkiConfig, default_ca_subject},
//! };
//!
//! # async fn run() -> Result<(), vpn_pki::error::PkiError> {
//! let authority = CertificateAuthority::from_config(&PkiConfig::default());
//!
//! // Load ./pki/ca.{key,crt} if present, build a new CA otherwise
//! authority.bootstrap(default_ca_subject()).await?;
//!
//! // Generate a key and a CSR for it, then sign it as a client certificate
//! let request = authority
//!     .generate_request(
//!         DistinguishedName::builder()
//!             .common_name("test-client".to_string())
//!             .build()
//!             .into(),
//!     )
//!     .await?;
//! let certificate = authority
//!     .sign_client_request(request.csr.to_pem()?)
//!     .await?;
//!
//! println!("Certificate:\n{}", certificate.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Serving the CA over HTTP
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vpn_pki::{
//!     authority::CertificateAuthority,
//!     config::{PkiConfig, default_ca_subject},
//!     http::{AppState, auth::StaticTokenAuthenticator, build_router},
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let authority = Arc::new(CertificateAuthority::from_config(&PkiConfig::default()));
//! authority.bootstrap(default_ca_subject()).await?;
//!
//! let router = build_router(Arc::new(AppState {
//!     authority,
//!     authenticator: Arc::new(StaticTokenAuthenticator::new(Some("secret".to_string()))),
//! }));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::PkiError`]. Caller mistakes
//! (unparsable or forged CSRs, unknown roles) are distinguishable from
//! internal failures:
//!
//! ```rust
//! use vpn_pki::{error::PkiError, role::CertificateRole};
//!
//! match "admin".parse::<CertificateRole>() {
//!     Ok(role) => println!("Role: {}", role),
//!     Err(e @ PkiError::UnknownRole(_)) => assert!(e.is_client_error()),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: RSA key generation, PEM import/export, signing and verification
//! - [`cert`]: Certificate encoding/decoding, subject names and extensions
//! - [`csr`]: Certificate signing requests
//! - [`issuer`]: Certificate issuing and serial numbers
//! - [`store`]: The PKI directory on disk
//! - [`ca`]: Building and loading the CA
//! - [`role`]: Client and server certificate profiles
//! - [`signer`]: Turning a CSR into a signed certificate
//! - [`worker`]: Bounded pool for CPU-heavy crypto
//! - [`authority`]: The CA handle used by the server
//! - [`http`]: The HTTP routes
//! - [`config`]: Configuration from the environment
//! - [`error`]: Error types

pub mod authority;
pub mod ca;
pub mod cert;
pub mod config;
pub mod csr;
pub mod error;
pub mod http;
pub mod issuer;
pub mod key;
pub mod role;
pub mod signer;
pub mod store;
pub mod tbs_certificate;
pub mod worker;
