#![allow(dead_code)]

use std::path::Path;

use tempfile::TempDir;
use vpn_pki::authority::CertificateAuthority;
use vpn_pki::cert::params::{DistinguishedName, RequestAttributes};
use vpn_pki::config::{IssuancePolicy, default_ca_subject};
use vpn_pki::store::PkiStore;
use vpn_pki::worker::CryptoPool;

/// A CA rooted in a temporary directory, removed on drop.
pub struct TestCa {
    pub dir: TempDir,
    pub authority: CertificateAuthority,
}

pub fn pki_root(dir: &Path) -> std::path::PathBuf {
    dir.join("pki")
}

pub fn new_authority(dir: &Path) -> CertificateAuthority {
    CertificateAuthority::new(
        PkiStore::new(pki_root(dir)),
        IssuancePolicy::default(),
        CryptoPool::new(2),
    )
}

/// C=France, ST=Ile-de-France, L=Paris, O=Community VPN,
/// OU=communityvpn.server, CN=Community VPN
pub fn community_vpn_subject() -> DistinguishedName {
    default_ca_subject()
}

/// The CA subject with CN=test-client.
pub fn test_client_attributes() -> RequestAttributes {
    RequestAttributes::builder()
        .subject(DistinguishedName {
            common_name: "test-client".to_string(),
            ..community_vpn_subject()
        })
        .unstructured_name("test".to_string())
        .build()
}

pub async fn bootstrapped_ca() -> TestCa {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let authority = new_authority(dir.path());
    authority
        .bootstrap(community_vpn_subject())
        .await
        .expect("CA should bootstrap");
    TestCa { dir, authority }
}

pub async fn client_csr_pem(authority: &CertificateAuthority) -> String {
    authority
        .generate_request(test_client_attributes())
        .await
        .expect("request should be generated")
        .csr
        .to_pem()
        .expect("request should encode")
}
