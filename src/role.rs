use std::fmt;
use std::str::FromStr;

use crate::ca::CaState;
use crate::cert::extensions::{
    BasicConstraints, CertificateExtension, ExtendedKeyUsage, ExtendedKeyUsageOption, KeyUsage,
    KeyUsages, SubjectKeyIdentifier,
};
use crate::error::PkiError;
use crate::key::PublicKey;

/// What an issued certificate may be used for.
///
/// | Role   | basicConstraints | extKeyUsage | keyUsage                            |
/// |--------|------------------|-------------|-------------------------------------|
/// | client | cA=false         | clientAuth  | digitalSignature                    |
/// | server | cA=false         | serverAuth  | digitalSignature, keyEncipherment   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateRole {
    Client,
    Server,
}

impl CertificateRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateRole::Client => "client",
            CertificateRole::Server => "server",
        }
    }

    fn extended_key_usage(&self) -> ExtendedKeyUsageOption {
        match self {
            CertificateRole::Client => ExtendedKeyUsageOption::ClientAuth,
            CertificateRole::Server => ExtendedKeyUsageOption::ServerAuth,
        }
    }

    fn key_usage(&self) -> KeyUsage {
        match self {
            CertificateRole::Client => KeyUsage(KeyUsages::DigitalSignature.into()),
            CertificateRole::Server => {
                KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment)
            }
        }
    }

    /// The extension list of a leaf certificate for `subject_public_key`
    /// issued by `ca`.
    pub fn extensions(
        &self,
        ca: &CaState,
        subject_public_key: &PublicKey,
    ) -> Vec<CertificateExtension> {
        vec![
            CertificateExtension::BasicConstraints(BasicConstraints { is_ca: false }),
            CertificateExtension::SubjectKeyIdentifier(SubjectKeyIdentifier(
                subject_public_key.key_identifier(),
            )),
            CertificateExtension::AuthorityKeyIdentifier(ca.authority_key_identifier()),
            CertificateExtension::ExtendedKeyUsage(ExtendedKeyUsage {
                usage: vec![self.extended_key_usage()],
            }),
            CertificateExtension::KeyUsage(self.key_usage()),
        ]
    }
}

impl fmt::Display for CertificateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateRole {
    type Err = PkiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(CertificateRole::Client),
            "server" => Ok(CertificateRole::Server),
            other => Err(PkiError::UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles_only() {
        assert_eq!("client".parse::<CertificateRole>().unwrap(), CertificateRole::Client);
        assert_eq!("server".parse::<CertificateRole>().unwrap(), CertificateRole::Server);
        assert!(matches!(
            "Client".parse::<CertificateRole>(),
            Err(PkiError::UnknownRole(_))
        ));
        assert!(matches!(
            "ca".parse::<CertificateRole>(),
            Err(PkiError::UnknownRole(_))
        ));
    }

    #[test]
    fn key_usage_never_allows_certificate_signing() {
        for role in [CertificateRole::Client, CertificateRole::Server] {
            let usage = role.key_usage();
            assert!(usage.contains(KeyUsages::DigitalSignature));
            assert!(!usage.contains(KeyUsages::KeyCertSign));
            assert!(!usage.contains(KeyUsages::CRLSign));
        }
        assert!(!CertificateRole::Client.key_usage().contains(KeyUsages::KeyEncipherment));
        assert!(CertificateRole::Server.key_usage().contains(KeyUsages::KeyEncipherment));
    }
}
