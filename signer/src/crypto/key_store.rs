use k256::ecdsa::{SigningKey, VerifyingKey};
use rand_core::OsRng;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::SignerError;
use crate::utils::file_lock::FileLock;
use crate::utils::file_operations::{
    create_new_file, decode_hex_secret, read_trimmed, write_atomically, PRIVATE_FILE_MODE,
    PUBLIC_FILE_MODE,
};

pub const SIGNING_KEY_FILENAME: &str = "signing-key";
pub const PUBLIC_KEY_FILENAME: &str = "public-key";
const SIGNING_KEY_LOCK_FILENAME: &str = "signing-key.lock";

/// The signer's secp256k1 keypair.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Parses a raw 32 byte private scalar given as hex.
    pub fn from_hex(private_key: &str) -> Result<Self, SignerError> {
        let bytes: [u8; 32] = decode_hex_secret(private_key)
            .map_err(|e| SignerError::key("Malformed signing key", e))?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| SignerError::key("Invalid signing key scalar", e))?;
        Ok(Self { signing_key })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Uncompressed SEC1 encoding, `04 || X || Y`.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Owns the signing key files in the data directory.
pub struct KeyStore {
    key_path: PathBuf,
    public_key_path: PathBuf,
    lock_path: PathBuf,
}

impl KeyStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            key_path: data_dir.join(SIGNING_KEY_FILENAME),
            public_key_path: data_dir.join(PUBLIC_KEY_FILENAME),
            lock_path: data_dir.join(SIGNING_KEY_LOCK_FILENAME),
        }
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    pub fn public_key_path(&self) -> &Path {
        &self.public_key_path
    }

    /// Loads the signing key, generating and persisting one on first use.
    pub fn load(&self) -> Result<Keypair, SignerError> {
        info!("Loading signing key");
        let _lock = FileLock::new_exclusive(&self.lock_path)
            .map_err(|e| SignerError::key("Failed to lock signing key", e))?;

        let keypair = match read_trimmed(&self.key_path) {
            Ok(Some(private_key)) => Keypair::from_hex(&private_key)?,
            Ok(None) => {
                info!("Signing key not found");
                self.generate()?
            }
            Err(e) => {
                return Err(SignerError::key(
                    &format!("Failed to read {}", self.key_path.display()),
                    e,
                ))
            }
        };

        self.write_public_key(&keypair)?;
        info!("Public Key: {}", keypair.public_key_hex());
        Ok(keypair)
    }

    fn generate(&self) -> Result<Keypair, SignerError> {
        info!("Generating signing key");
        let keypair = Keypair::generate();
        create_new_file(
            &self.key_path,
            keypair.to_hex().as_bytes(),
            PRIVATE_FILE_MODE,
        )
        .map_err(|e| {
            SignerError::key(
                &format!("Failed to write {}", self.key_path.display()),
                e,
            )
        })?;

        warn!(
            "New signing key generated, register public key {} with the NVL operator",
            keypair.public_key_hex()
        );
        Ok(keypair)
    }

    fn write_public_key(&self, keypair: &Keypair) -> Result<(), SignerError> {
        let public_key = keypair.public_key_hex();
        match read_trimmed(&self.public_key_path) {
            Ok(Some(existing)) if existing == public_key => return Ok(()),
            Ok(Some(_)) => warn!(
                "{} does not match the signing key, rewriting it",
                self.public_key_path.display()
            ),
            Ok(None) => debug!("Writing {}", self.public_key_path.display()),
            Err(e) => warn!("Failed to read {}: {}", self.public_key_path.display(), e),
        }

        write_atomically(&self.public_key_path, public_key.as_bytes(), PUBLIC_FILE_MODE)
            .map_err(|e| {
                SignerError::key(
                    &format!("Failed to write {}", self.public_key_path.display()),
                    e,
                )
            })
    }
}
