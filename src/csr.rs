//! Certificate signing requests (PKCS#10).
//!
//! Requests are attacker-controlled input: [`CertificationRequest::from_pem`]
//! and [`CertificationRequest::verify`] report every failure as
//! [`PkiError::MalformedInput`].

use der::asn1::{Any, BitString, SetOfVec, Utf8StringRef};
use der::{DecodePem, Encode, EncodePem};
use x509_cert::attr::Attribute;
use x509_cert::name::Name;
use x509_cert::request::{CertReq, CertReqInfo, Version};

use crate::cert::SignatureAlgorithm;
use crate::cert::params::{RequestAttributes, UNSTRUCTURED_NAME, attribute_text};
use crate::error::{PkiError, Result};
use crate::key::{KeyPair, PublicKey};

/// A parsed certificate signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificationRequest {
    pub inner: CertReq,
}

impl CertificationRequest {
    pub fn from_pem(pem: &str) -> Result<Self> {
        let inner = CertReq::from_pem(pem)
            .map_err(|e| PkiError::MalformedInput(format!("unable to parse CSR: {e}")))?;
        Ok(Self { inner })
    }

    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| PkiError::EncodingError(e.to_string()))
    }

    pub fn subject(&self) -> &Name {
        &self.inner.info.subject
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_x509spki(&self.inner.info.public_key)
    }

    /// The PKCS#9 unstructuredName request attribute, if present.
    pub fn unstructured_name(&self) -> Result<Option<String>> {
        self.inner
            .info
            .attributes
            .iter()
            .find(|attr| attr.oid == UNSTRUCTURED_NAME)
            .and_then(|attr| attr.values.iter().next())
            .map(attribute_text)
            .transpose()
    }

    /// Checks the request's self-signature against its own public key.
    pub fn verify(&self) -> Result<()> {
        let info = self
            .inner
            .info
            .to_der()
            .map_err(|e| PkiError::MalformedInput(e.to_string()))?;
        let signature = self
            .inner
            .signature
            .as_bytes()
            .ok_or_else(|| PkiError::MalformedInput("signature has unused bits".to_string()))?;

        self.public_key()
            .verify(&self.inner.algorithm, &info, signature)
            .map_err(|e| PkiError::MalformedInput(format!("invalid CSR signature: {e}")))
    }
}

/// A request together with the freshly generated key it certifies.
#[derive(Debug, Clone)]
pub struct GeneratedRequest {
    pub csr: CertificationRequest,
    pub key_pair: KeyPair,
}

/// Generates an RSA key pair of `key_size` bits and a request for it,
/// self-signed with SHA-256.
pub fn generate_request(attributes: &RequestAttributes, key_size: usize) -> Result<GeneratedRequest> {
    let key_pair = KeyPair::generate_rsa(key_size)?;

    let mut attrs = Vec::new();
    if let Some(unstructured_name) = &attributes.unstructured_name {
        let value = Any::encode_from(&Utf8StringRef::new(unstructured_name)?)?;
        attrs.push(Attribute {
            oid: UNSTRUCTURED_NAME,
            values: SetOfVec::try_from(vec![value])?,
        });
    }

    let info = CertReqInfo {
        version: Version::V1,
        subject: attributes.subject.as_x509_name()?,
        public_key: key_pair.public_key()?.as_spki().clone(),
        attributes: SetOfVec::try_from(attrs)?,
    };

    let info_der = info
        .to_der()
        .map_err(|e| PkiError::EncodingError(e.to_string()))?;
    let signature = key_pair.sign_data(&info_der)?;

    let csr = CertificationRequest {
        inner: CertReq {
            info,
            algorithm: SignatureAlgorithm::Sha256WithRSA.into(),
            signature: BitString::from_bytes(&signature)?,
        },
    };

    Ok(GeneratedRequest { csr, key_pair })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::params::DistinguishedName;

    fn attributes() -> RequestAttributes {
        RequestAttributes::builder()
            .subject(
                DistinguishedName::builder()
                    .country("France".to_string())
                    .organization("Community VPN".to_string())
                    .common_name("test-client".to_string())
                    .build(),
            )
            .unstructured_name("test".to_string())
            .build()
    }

    #[test]
    fn generated_request_verifies_after_pem_round_trip() {
        let generated = generate_request(&attributes(), 2048).unwrap();
        let pem = generated.csr.to_pem().unwrap();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE REQUEST-----"));

        let parsed = CertificationRequest::from_pem(&pem).unwrap();
        parsed.verify().unwrap();
        assert_eq!(parsed.public_key(), generated.key_pair.public_key().unwrap());
    }

    #[test]
    fn unstructured_name_is_an_attribute_not_a_subject_rdn() {
        let generated = generate_request(&attributes(), 2048).unwrap();
        assert_eq!(
            generated.csr.unstructured_name().unwrap().as_deref(),
            Some("test")
        );
        let subject = DistinguishedName::from_x509_name(generated.csr.subject()).unwrap();
        assert_eq!(subject, attributes().subject);
        assert!(
            generated
                .csr
                .subject()
                .0
                .iter()
                .flat_map(|rdn| rdn.0.iter())
                .all(|atv| atv.oid != UNSTRUCTURED_NAME)
        );
    }

    #[test]
    fn tampered_subject_fails_verification() {
        let mut generated = generate_request(&attributes(), 2048).unwrap();
        generated.csr.inner.info.subject = DistinguishedName::builder()
            .common_name("admin".to_string())
            .build()
            .as_x509_name()
            .unwrap();
        assert!(matches!(
            generated.csr.verify(),
            Err(PkiError::MalformedInput(_))
        ));
    }

    #[test]
    fn unparsable_pem_is_malformed_input() {
        assert!(matches!(
            CertificationRequest::from_pem("-----BEGIN CERTIFICATE REQUEST-----\nZm9v\n-----END CERTIFICATE REQUEST-----\n"),
            Err(PkiError::MalformedInput(_))
        ));
    }
}
