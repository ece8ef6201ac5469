use bon::Builder;
use der::asn1::BitString;
use rand::RngCore;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::cert::extensions::CertificateExtension;
use crate::cert::params::Validity;
use crate::cert::{Certificate, SignatureAlgorithm};
use crate::error::{PkiError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::tbs_certificate::TbsCertificate;

/// Parameters of a certificate about to be issued.
///
/// # Fields
/// * `serial_number` - Serial of the new certificate.
/// * `validity` - Validity window of the new certificate.
/// * `subject` - Subject name, copied into the certificate as-is.
/// * `subject_public_key` - The public key being certified.
/// * `extensions` - The full extension list of the new certificate.
#[derive(Clone, Debug, Builder)]
pub struct CertificateParams {
    pub serial_number: SerialNumber,
    pub validity: Validity,
    pub subject: Name,
    pub subject_public_key: PublicKey,
    #[builder(default)]
    pub extensions: Vec<CertificateExtension>,
}

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the distinguished name written as the issuer of new certificates.
    fn issuer_name(&self) -> &Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Issues a certificate: the issuer name is this issuer's, the signature
    /// is SHA-256 with RSA under [`Issuer::signing_key`].
    fn issue(&self, params: CertificateParams) -> Result<Certificate> {
        let signature_algorithm = SignatureAlgorithm::Sha256WithRSA;

        let tbs_cert = TbsCertificate {
            serial_number: params.serial_number,
            signature_algorithm,
            issuer: self.issuer_name().clone(),
            validity: params.validity,
            subject: params.subject,
            subject_public_key: params.subject_public_key,
            extensions: params.extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let tbs_der = der::Encode::to_der(&tbs_cert_inner)
            .map_err(|e| PkiError::EncodingError(e.to_string()))?;
        let signature = self.signing_key().sign_data(&tbs_der)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algorithm.into(),
            signature: BitString::from_bytes(&signature)?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}

/// Issuer of a self-signed certificate: its name is the subject being certified.
pub(crate) struct SelfIssuer<'a> {
    pub(crate) name: Name,
    pub(crate) key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> &Name {
        &self.name
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}

/// Draws `size` random bytes as a positive serial number.
///
/// Serials are independent per call; nothing records which ones were issued.
pub fn random_serial_number(size: usize) -> Result<SerialNumber> {
    if size == 0 || size > 20 {
        return Err(PkiError::InvalidInput(format!(
            "Serial number size must be between 1 and 20 bytes, got {size}"
        )));
    }
    let mut bytes = vec![0u8; size];
    rand::rng().fill_bytes(&mut bytes);
    Ok(SerialNumber::new(&bytes)?)
}
