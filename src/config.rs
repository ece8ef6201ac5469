use std::env;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::cert::params::DistinguishedName;
use crate::store::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, PkiStore};

/// Accepted `PKI_KEY_SIZE` values, in bits.
pub const KEY_SIZE_RANGE: RangeInclusive<usize> = 2048..=16384;
/// Accepted `PKI_VALIDITY_DAYS` values.
pub const VALIDITY_DAYS_RANGE: RangeInclusive<i64> = 1..=36500;

/// Key size, lifetime and serial width of everything this CA creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuancePolicy {
    /// RSA modulus size in bits.
    pub key_size: usize,
    /// Validity period of the CA and of issued certificates.
    pub validity_days: i64,
    /// Number of random bytes in a serial number.
    pub serial_number_size: usize,
}

impl Default for IssuancePolicy {
    fn default() -> Self {
        IssuancePolicy {
            key_size: 2048,
            validity_days: 3650,
            serial_number_size: 9,
        }
    }
}

/// PKI configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct PkiConfig {
    /// Directory holding `ca.key` and `ca.crt`.
    pub root: PathBuf,
    pub dir_mode: u32,
    pub file_mode: u32,
    pub policy: IssuancePolicy,
    /// Upper bound on concurrent key generation / signing jobs.
    pub workers: usize,
    /// Subject of a newly built CA.
    pub ca_subject: DistinguishedName,
}

impl Default for PkiConfig {
    fn default() -> Self {
        PkiConfig {
            root: PathBuf::from("./pki"),
            dir_mode: DEFAULT_DIR_MODE,
            file_mode: DEFAULT_FILE_MODE,
            policy: IssuancePolicy::default(),
            workers: default_workers(),
            ca_subject: default_ca_subject(),
        }
    }
}

impl PkiConfig {
    /// Load configuration from environment variables.
    ///
    /// - `PKI_DIR` (default `./pki`)
    /// - `PKI_KEY_SIZE` (default 2048, at least 2048)
    /// - `PKI_VALIDITY_DAYS` (default 3650, at most 100 years)
    /// - `PKI_WORKERS` (default: available parallelism)
    /// - `PKI_CA_C`, `PKI_CA_ST`, `PKI_CA_L`, `PKI_CA_O`, `PKI_CA_OU`,
    ///   `PKI_CA_CN`: CA subject attributes, defaulting to the Community VPN
    ///   subject.
    pub fn from_env() -> Self {
        let defaults = PkiConfig::default();
        let subject = defaults.ca_subject;

        let ca_subject = DistinguishedName {
            country: env_string("PKI_CA_C").or(subject.country),
            state: env_string("PKI_CA_ST").or(subject.state),
            locality: env_string("PKI_CA_L").or(subject.locality),
            organization: env_string("PKI_CA_O").or(subject.organization),
            organizational_unit: env_string("PKI_CA_OU").or(subject.organizational_unit),
            common_name: env_string("PKI_CA_CN").unwrap_or(subject.common_name),
        };

        PkiConfig {
            root: env_string("PKI_DIR").map(PathBuf::from).unwrap_or(defaults.root),
            dir_mode: defaults.dir_mode,
            file_mode: defaults.file_mode,
            policy: IssuancePolicy {
                key_size: within("PKI_KEY_SIZE", env_parse("PKI_KEY_SIZE"), KEY_SIZE_RANGE)
                    .unwrap_or(defaults.policy.key_size),
                validity_days: within(
                    "PKI_VALIDITY_DAYS",
                    env_parse("PKI_VALIDITY_DAYS"),
                    VALIDITY_DAYS_RANGE,
                )
                .unwrap_or(defaults.policy.validity_days),
                serial_number_size: defaults.policy.serial_number_size,
            },
            workers: env_parse("PKI_WORKERS")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.workers),
            ca_subject,
        }
    }

    pub fn store(&self) -> PkiStore {
        PkiStore::with_modes(&self.root, self.dir_mode, self.file_mode)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Bearer token accepted on authenticated routes. When unset every
    /// authenticated route answers 401.
    pub api_token: Option<String>,
}

impl ServerConfig {
    /// - `PORT` (default 8000)
    /// - `PKI_API_TOKEN` (optional)
    pub fn from_env() -> Self {
        ServerConfig {
            port: env_parse("PORT").unwrap_or(8000),
            api_token: env_string("PKI_API_TOKEN"),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env_string(name)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "ignoring unparsable value");
            None
        }
    }
}

fn within<T: PartialOrd + Display>(
    name: &str,
    value: Option<T>,
    range: RangeInclusive<T>,
) -> Option<T> {
    let value = value?;
    if range.contains(&value) {
        return Some(value);
    }
    tracing::warn!(
        variable = name,
        value = %value,
        min = %range.start(),
        max = %range.end(),
        "ignoring out-of-range value"
    );
    None
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// The subject the VPN platform bootstraps its CA with.
pub fn default_ca_subject() -> DistinguishedName {
    DistinguishedName::builder()
        .country("France".to_string())
        .state("Ile-de-France".to_string())
        .locality("Paris".to_string())
        .organization("Community VPN".to_string())
        .organizational_unit("communityvpn.server".to_string())
        .common_name("Community VPN".to_string())
        .build()
}
