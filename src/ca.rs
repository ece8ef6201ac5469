use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, CertificateExtension, KeyUsage, KeyUsages,
    SubjectKeyIdentifier,
};
use crate::cert::params::{DistinguishedName, Validity};
use crate::config::IssuancePolicy;
use crate::error::{PkiError, Result};
use crate::issuer::{CertificateParams, Issuer, SelfIssuer, random_serial_number};
use crate::key::KeyPair;
use crate::store::PkiStore;

/// The CA's private key and self-signed certificate.
///
/// Built or loaded once, then only read.
#[derive(Debug, Clone)]
pub struct CaState {
    key: KeyPair,
    certificate: Certificate,
    key_identifier: Vec<u8>,
}

impl CaState {
    /// Pairs a key with its certificate, rejecting a key that does not match
    /// the certified public key.
    pub fn new(key: KeyPair, certificate: Certificate) -> Result<Self> {
        if key.public_key()? != certificate.public_key() {
            return Err(PkiError::DecodingError(
                "CA private key does not match the CA certificate".to_string(),
            ));
        }
        let key_identifier = certificate.key_identifier()?;
        Ok(CaState {
            key,
            certificate,
            key_identifier,
        })
    }

    /// Reads and parses `ca.key` and `ca.crt`.
    pub fn load(store: &PkiStore) -> Result<Self> {
        tracing::info!(path = %store.root().display(), "loading CA");

        let (key_pem, cert_pem) = store.read_ca_files()?;
        let key = KeyPair::import_from_pem(&key_pem)?;
        let certificate = Certificate::from_pem(&cert_pem)?;
        Self::new(key, certificate)
    }

    /// Generates a fresh key, self-signs a CA certificate for `attributes`
    /// and writes both to the store, creating the PKI directory if needed.
    pub fn build(
        store: &PkiStore,
        policy: &IssuancePolicy,
        attributes: &DistinguishedName,
    ) -> Result<Self> {
        if !store.has_pki_directory()? {
            store.init_pki_directory()?;
        }

        tracing::info!(path = %store.root().display(), key_size = policy.key_size, "building CA");

        let key = KeyPair::generate_rsa(policy.key_size)?;
        let public_key = key.public_key()?;
        let subject = attributes.as_x509_name()?;
        let serial_number = random_serial_number(policy.serial_number_size)?;
        let key_identifier = public_key.key_identifier();

        let extensions = vec![
            CertificateExtension::SubjectKeyIdentifier(SubjectKeyIdentifier(
                key_identifier.clone(),
            )),
            CertificateExtension::AuthorityKeyIdentifier(AuthorityKeyIdentifier {
                key_identifier: key_identifier.clone(),
                authority_cert_issuer: subject.clone(),
                authority_cert_serial_number: serial_number.clone(),
            }),
            CertificateExtension::BasicConstraints(BasicConstraints { is_ca: true }),
            CertificateExtension::KeyUsage(KeyUsage(
                KeyUsages::KeyCertSign | KeyUsages::CRLSign,
            )),
        ];

        let self_issuer = SelfIssuer {
            name: subject.clone(),
            key: &key,
        };
        let certificate = self_issuer.issue(
            CertificateParams::builder()
                .serial_number(serial_number)
                .validity(Validity::for_days(policy.validity_days))
                .subject(subject)
                .subject_public_key(public_key)
                .extensions(extensions)
                .build(),
        )?;

        store.write_ca_files(&key.to_pkcs8_pem()?, &certificate.to_pem()?)?;

        Ok(CaState {
            key,
            certificate,
            key_identifier,
        })
    }

    pub fn key(&self) -> &KeyPair {
        &self.key
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn certificate_pem(&self) -> Result<String> {
        self.certificate.to_pem()
    }

    /// The authority key identifier written into every certificate this CA
    /// signs: the CA's subject key identifier, its issuer name and its serial.
    pub fn authority_key_identifier(&self) -> AuthorityKeyIdentifier {
        AuthorityKeyIdentifier {
            key_identifier: self.key_identifier.clone(),
            authority_cert_issuer: self.certificate.issuer().clone(),
            authority_cert_serial_number: self.certificate.serial_number().clone(),
        }
    }
}

impl Issuer for CaState {
    fn issuer_name(&self) -> &Name {
        self.certificate.subject()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }
}
