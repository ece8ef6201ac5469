use crate::ca::CaState;
use crate::cert::Certificate;
use crate::cert::params::Validity;
use crate::config::IssuancePolicy;
use crate::csr::CertificationRequest;
use crate::error::Result;
use crate::issuer::{CertificateParams, Issuer, random_serial_number};
use crate::role::CertificateRole;

/// Signs a PEM-encoded CSR with the CA, producing a leaf certificate for
/// `role`.
///
/// The request must parse and carry a valid self-signature. Its subject is
/// copied verbatim; nothing checks it against the caller's identity.
pub fn sign_request(
    ca: &CaState,
    policy: &IssuancePolicy,
    csr_pem: &str,
    role: CertificateRole,
) -> Result<Certificate> {
    let csr = CertificationRequest::from_pem(csr_pem)?;
    csr.verify()?;

    let subject_public_key = csr.public_key();
    let extensions = role.extensions(ca, &subject_public_key);

    let certificate = ca.issue(
        CertificateParams::builder()
            .serial_number(random_serial_number(policy.serial_number_size)?)
            .validity(Validity::for_days(policy.validity_days))
            .subject(csr.subject().clone())
            .subject_public_key(subject_public_key)
            .extensions(extensions)
            .build(),
    )?;

    tracing::debug!(
        role = %role,
        serial = %certificate.serial_hex(),
        "signed certificate request"
    );
    Ok(certificate)
}
