use der::Encode;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::error::{PkiError, Result};

/// PEM label written by [`KeyPair::to_pkcs8_pem`].
pub const PKCS8_PEM_LABEL: &str = "PRIVATE KEY";

/// PEM label of legacy PKCS#1 RSA private keys.
pub const PKCS1_PEM_LABEL: &str = "RSA PRIVATE KEY";

/// An RSA key pair.
///
/// The CA and every generated request use RSA with the public exponent
/// 65537, which is what `RsaPrivateKey::new` produces.
#[derive(Clone)]
pub struct KeyPair {
    private: Box<RsaPrivateKey>,
    public: RsaPublicKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| PkiError::KeyGenerationError(e.to_string()))?;
        Ok(Self::from_private(private))
    }

    fn from_private(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyPair {
            private: Box::new(private),
            public,
        }
    }

    /// Import a private key from PEM, accepting either PKCS#8 (`PRIVATE KEY`)
    /// or PKCS#1 (`RSA PRIVATE KEY`) encoding.
    pub fn import_from_pem(pem: &str) -> Result<Self> {
        let private = if pem.contains(PKCS1_PEM_LABEL) {
            RsaPrivateKey::from_pkcs1_pem(pem)?
        } else {
            RsaPrivateKey::from_pkcs8_pem(pem)?
        };
        Ok(Self::from_private(private))
    }

    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let doc = self
            .private
            .to_pkcs8_der()
            .map_err(|e| PkiError::EncodingError(e.to_string()))?;
        Ok(doc.as_bytes().to_vec())
    }

    pub fn to_pkcs8_pem(&self) -> Result<String> {
        let pem = self
            .private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| PkiError::EncodingError(e.to_string()))?;
        Ok(pem.as_str().to_owned())
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_key_pair(self)
    }

    /// Signs `data` with RSASSA-PKCS1-v1_5 over SHA-256.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signing_key = SigningKey::<Sha256>::new((*self.private).clone());
        let signature = signing_key
            .try_sign(data)
            .map_err(|e| PkiError::RsaError(e.to_string()))?;
        Ok(signature.to_vec())
    }
}

/// A subject public key, kept in its X.509 `SubjectPublicKeyInfo` form so that
/// keys taken from requests are copied into certificates byte for byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    spki: SubjectPublicKeyInfoOwned,
}

impl PublicKey {
    pub fn from_key_pair(key_pair: &KeyPair) -> Result<Self> {
        let spki = SubjectPublicKeyInfoOwned::from_key(key_pair.public.clone())?;
        Ok(Self { spki })
    }

    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Self {
        Self { spki: spki.clone() }
    }

    pub fn as_spki(&self) -> &SubjectPublicKeyInfoOwned {
        &self.spki
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.spki
            .to_der()
            .map_err(|e| PkiError::EncodingError(e.to_string()))
    }

    /// SHA-1 over the subject public key bits (RFC 5280 4.2.1.2, method 1).
    pub fn key_identifier(&self) -> Vec<u8> {
        <Sha1 as sha1::Digest>::digest(self.spki.subject_public_key.raw_bytes()).to_vec()
    }

    fn rsa(&self) -> Result<RsaPublicKey> {
        if self.spki.algorithm.oid != const_oid::db::rfc5912::RSA_ENCRYPTION {
            return Err(PkiError::InvalidInput(format!(
                "Unsupported public key algorithm {}",
                self.spki.algorithm.oid
            )));
        }
        Ok(RsaPublicKey::from_public_key_der(&self.to_der()?)?)
    }

    /// Verifies an RSASSA-PKCS1-v1_5 `signature` over `message`, using the
    /// digest named by `algorithm`.
    pub fn verify(
        &self,
        algorithm: &AlgorithmIdentifierOwned,
        message: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        let public = self.rsa()?;
        let signature = Signature::try_from(signature)
            .map_err(|e| PkiError::InvalidInput(e.to_string()))?;

        let verified = match algorithm.oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                VerifyingKey::<Sha256>::new(public).verify(message, &signature)
            }
            const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION => {
                VerifyingKey::<Sha384>::new(public).verify(message, &signature)
            }
            const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION => {
                VerifyingKey::<Sha512>::new(public).verify(message, &signature)
            }
            other => {
                return Err(PkiError::InvalidInput(format!(
                    "Unsupported signature algorithm {other}"
                )));
            }
        };

        verified.map_err(|_| PkiError::InvalidInput("Signature verification failed".to_string()))
    }
}
