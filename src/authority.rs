use std::sync::{Arc, OnceLock};

use tokio::sync::Mutex;

use crate::ca::CaState;
use crate::cert::Certificate;
use crate::cert::params::{DistinguishedName, RequestAttributes};
use crate::config::{IssuancePolicy, PkiConfig};
use crate::csr::{self, GeneratedRequest};
use crate::error::{PkiError, Result};
use crate::role::CertificateRole;
use crate::signer;
use crate::store::PkiStore;
use crate::worker::CryptoPool;

/// A certificate authority rooted at one PKI directory.
///
/// Holds at most one [`CaState`], installed once by [`load_ca`] or
/// [`build_ca`] and read-only afterwards. Key generation and signing run on
/// the authority's [`CryptoPool`]. Loading and building are serialised, so
/// the CA on disk is always the one installed.
///
/// [`load_ca`]: CertificateAuthority::load_ca
/// [`build_ca`]: CertificateAuthority::build_ca
#[derive(Debug)]
pub struct CertificateAuthority {
    store: PkiStore,
    policy: IssuancePolicy,
    pool: CryptoPool,
    ca: OnceLock<Arc<CaState>>,
    install_lock: Mutex<()>,
}

impl CertificateAuthority {
    pub fn new(store: PkiStore, policy: IssuancePolicy, pool: CryptoPool) -> Self {
        CertificateAuthority {
            store,
            policy,
            pool,
            ca: OnceLock::new(),
            install_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &PkiConfig) -> Self {
        Self::new(
            config.store(),
            config.policy,
            CryptoPool::new(config.workers),
        )
    }

    pub fn store(&self) -> &PkiStore {
        &self.store
    }

    pub fn has_pki_directory(&self) -> Result<bool> {
        self.store.has_pki_directory()
    }

    pub fn has_ca(&self) -> Result<bool> {
        self.store.has_ca()
    }

    pub fn init_pki_directory(&self) -> Result<()> {
        self.store.init_pki_directory()
    }

    /// Reads the CA from disk and installs it.
    pub async fn load_ca(&self) -> Result<Arc<CaState>> {
        let _guard = self.install_lock.lock().await;
        self.ensure_not_installed()?;
        let store = self.store.clone();
        let state = self.pool.run(move || CaState::load(&store)).await?;
        self.install(state)
    }

    /// Creates a new CA for `attributes`, persists it and installs it.
    ///
    /// Refuses to run once a CA is installed, so an installed CA's files are
    /// never overwritten.
    pub async fn build_ca(&self, attributes: DistinguishedName) -> Result<Arc<CaState>> {
        let _guard = self.install_lock.lock().await;
        self.ensure_not_installed()?;
        let store = self.store.clone();
        let policy = self.policy;
        let state = self
            .pool
            .run(move || CaState::build(&store, &policy, &attributes))
            .await?;
        self.install(state)
    }

    /// Loads the CA if one is on disk, builds one for `attributes` otherwise.
    pub async fn bootstrap(&self, attributes: DistinguishedName) -> Result<Arc<CaState>> {
        if self.has_ca()? {
            self.load_ca().await
        } else {
            self.build_ca(attributes).await
        }
    }

    /// The installed CA.
    pub fn ca_state(&self) -> Result<Arc<CaState>> {
        match self.ca.get() {
            Some(state) => Ok(Arc::clone(state)),
            None => {
                tracing::error!(path = %self.store.root().display(), "no CA loaded");
                Err(PkiError::NoCaLoaded)
            }
        }
    }

    pub fn ca_certificate_pem(&self) -> Result<String> {
        self.ca_state()?.certificate_pem()
    }

    pub async fn sign_request(&self, csr_pem: String, role: CertificateRole) -> Result<Certificate> {
        let ca = self.ca_state()?;
        let policy = self.policy;
        self.pool
            .run(move || signer::sign_request(&ca, &policy, &csr_pem, role))
            .await
    }

    pub async fn sign_client_request(&self, csr_pem: String) -> Result<Certificate> {
        self.sign_request(csr_pem, CertificateRole::Client).await
    }

    pub async fn sign_server_request(&self, csr_pem: String) -> Result<Certificate> {
        self.sign_request(csr_pem, CertificateRole::Server).await
    }

    /// Generates a key pair and a CSR for it. The key is returned to the
    /// caller and never stored.
    pub async fn generate_request(&self, attributes: RequestAttributes) -> Result<GeneratedRequest> {
        let key_size = self.policy.key_size;
        self.pool
            .run(move || csr::generate_request(&attributes, key_size))
            .await
    }

    fn ensure_not_installed(&self) -> Result<()> {
        if self.ca.get().is_some() {
            return Err(PkiError::CaAlreadyInstalled);
        }
        Ok(())
    }

    fn install(&self, state: CaState) -> Result<Arc<CaState>> {
        let state = Arc::new(state);
        self.ca
            .set(Arc::clone(&state))
            .map_err(|_| PkiError::CaAlreadyInstalled)?;
        Ok(state)
    }
}
