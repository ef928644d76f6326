use k256::ecdsa::{signature::hazmat::PrehashVerifier, Signature, VerifyingKey};
use tracing::debug;

use super::keccak::keccak256;
use crate::error::SignerError;
use crate::nvl::{canonical, Block};

const SIGNATURE_LEN: usize = 64;

/// Raw SEC1 bytes of a secp256k1 public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyBytes(Vec<u8>);

impl PublicKeyBytes {
    pub fn from_hex(public_key: &str) -> Result<Self, SignerError> {
        let public_key = public_key.trim();
        let bytes = hex::decode(public_key.strip_prefix("0x").unwrap_or(public_key))
            .map_err(|e| SignerError::protocol("Malformed public key hex", e))?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SignerError> {
        VerifyingKey::from_sec1_bytes(&bytes)
            .map_err(|e| SignerError::protocol("Public key is not a secp256k1 point", e))?;
        Ok(Self(bytes))
    }

    #[cfg(test)]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn to_verifying_key(&self) -> Result<VerifyingKey, SignerError> {
        VerifyingKey::from_sec1_bytes(&self.0)
            .map_err(|e| SignerError::protocol("Public key is not a secp256k1 point", e))
    }
}

/// Checks the block's seal signature against `public_key`.
///
/// The seal holds `r || s || v`; the recovery byte is dropped and only the 64
/// byte `(r, s)` pair is checked against the Keccak-256 of the canonical
/// payload. Signatures are taken as they are, so a high-S signature does not
/// verify. Anything that fails to verify yields `Ok(false)`; errors are
/// reserved for a seal or key that cannot be decoded at all.
pub fn verify_block(public_key: &PublicKeyBytes, block: &Block) -> Result<bool, SignerError> {
    let verifying_key = public_key.to_verifying_key()?;

    if block.seal.signature.is_empty() {
        return Err(SignerError::Protocol("Block has no signature".to_string()));
    }
    let seal = hex::decode(&block.seal.signature)
        .map_err(|e| SignerError::protocol("Malformed signature hex", e))?;

    let Some((_recovery_id, rs)) = seal.split_last() else {
        return Err(SignerError::Protocol("Block has no signature".to_string()));
    };
    if rs.len() != SIGNATURE_LEN {
        debug!("Signature has {} bytes, expected {}", rs.len(), SIGNATURE_LEN);
        return Ok(false);
    }
    let Ok(signature) = Signature::from_slice(rs) else {
        debug!("Signature scalars are out of range");
        return Ok(false);
    };

    let hash = keccak256(&canonical::signing_bytes(block));
    Ok(verifying_key.verify_prehash(&hash, &signature).is_ok())
}
