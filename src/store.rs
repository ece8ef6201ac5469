//! On-disk layout of the CA material.
//!
//! ```text
//! pki/          (0700)
//! ├── ca.key    (0600, PEM private key)
//! └── ca.crt    (0600, PEM certificate)
//! ```

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{PkiError, Result};

pub const CA_KEY_FILENAME: &str = "ca.key";
pub const CA_CERT_FILENAME: &str = "ca.crt";

/// Owner-only directory permissions.
pub const DEFAULT_DIR_MODE: u32 = 0o700;
/// Owner-only file permissions.
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// Filesystem access to the PKI directory.
#[derive(Debug, Clone)]
pub struct PkiStore {
    root: PathBuf,
    dir_mode: u32,
    file_mode: u32,
}

impl PkiStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_modes(root, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE)
    }

    pub fn with_modes(root: impl Into<PathBuf>, dir_mode: u32, file_mode: u32) -> Self {
        PkiStore {
            root: root.into(),
            dir_mode,
            file_mode,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn key_path(&self) -> PathBuf {
        self.root.join(CA_KEY_FILENAME)
    }

    pub fn cert_path(&self) -> PathBuf {
        self.root.join(CA_CERT_FILENAME)
    }

    /// True iff the root exists and is a directory. "Not found" is `false`,
    /// any other I/O error propagates.
    pub fn has_pki_directory(&self) -> Result<bool> {
        Ok(stat(&self.root)?.is_some_and(|meta| meta.is_dir()))
    }

    /// True iff the PKI directory exists and both the key and the certificate
    /// are regular files.
    pub fn has_ca(&self) -> Result<bool> {
        if !self.has_pki_directory()? {
            return Ok(false);
        }
        let key = stat(&self.key_path())?;
        let cert = stat(&self.cert_path())?;
        Ok(key.is_some_and(|m| m.is_file()) && cert.is_some_and(|m| m.is_file()))
    }

    /// Creates the root directory with owner-only permissions. The parent
    /// must already exist and be writable.
    pub fn init_pki_directory(&self) -> Result<()> {
        tracing::info!(path = %self.root.display(), "initialising PKI directory");

        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(self.dir_mode);
        }
        builder
            .create(&self.root)
            .map_err(|e| PkiError::filesystem(&self.root, e))
    }

    /// Reads `(ca.key, ca.crt)` as PEM text.
    pub fn read_ca_files(&self) -> Result<(String, String)> {
        let key_path = self.key_path();
        let cert_path = self.cert_path();
        let key = fs::read_to_string(&key_path).map_err(|e| PkiError::filesystem(&key_path, e))?;
        let cert =
            fs::read_to_string(&cert_path).map_err(|e| PkiError::filesystem(&cert_path, e))?;
        Ok((key, cert))
    }

    /// Writes the CA key and certificate with the configured file mode,
    /// replacing existing files.
    pub fn write_ca_files(&self, key_pem: &str, cert_pem: &str) -> Result<()> {
        self.write_file(&self.key_path(), key_pem.as_bytes())?;
        self.write_file(&self.cert_path(), cert_pem.as_bytes())
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut opts = fs::OpenOptions::new();
        opts.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(self.file_mode);
        }

        let mut file = opts.open(path).map_err(|e| PkiError::filesystem(path, e))?;
        file.write_all(contents)
            .and_then(|()| file.sync_all())
            .map_err(|e| PkiError::filesystem(path, e))?;

        // `mode` only applies on creation; tighten files that already existed.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(self.file_mode))
                .map_err(|e| PkiError::filesystem(path, e))?;
        }
        Ok(())
    }
}

fn stat(path: &Path) -> Result<Option<fs::Metadata>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PkiError::filesystem(path, e)),
    }
}
