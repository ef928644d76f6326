use tracing::{debug, info};

use super::keccak::keccak256;
use super::key_store::Keypair;
use crate::error::SignerError;
use crate::nvl::{canonical, Block, BlockHeader, BlockType, ProtocolPolicy};

/// Builds and signs this signer's independent blocks.
pub struct BlockBuilder<'a> {
    keypair: &'a Keypair,
    policy: ProtocolPolicy,
}

impl<'a> BlockBuilder<'a> {
    pub fn new(keypair: &'a Keypair, policy: ProtocolPolicy) -> Self {
        Self { keypair, policy }
    }

    /// Unsealed independent block attesting `verified`, chained to `prior_hash`.
    pub fn build(&self, verified: &Block, prior_hash: &str, timestamp: i64) -> Block {
        info!("Creating independent NVL block");
        let header = BlockHeader {
            block_type: BlockType::Independent,
            prior_block: prior_hash.to_string(),
            timestamp: timestamp.to_string(),
            public_key: self.keypair.public_key_hex(),
            coiin_supply: self.policy.coiin_supply_from(verified),
        };
        Block::new(header, vec![self.policy.reference_to(verified)])
    }

    /// Returns `(hash, signature)` over the canonical payload of `block`:
    /// 64 hex chars of Keccak-256 and 130 hex chars of `r || s || v`.
    /// Nonces follow RFC 6979, so equal inputs give equal signatures.
    pub fn sign(&self, block: &Block) -> Result<(String, String), SignerError> {
        let hash = keccak256(&canonical::signing_bytes(block));
        let (signature, recovery_id) = self
            .keypair
            .signing_key()
            .sign_prehash_recoverable(&hash)
            .map_err(|e| SignerError::key("Failed to sign independent block", e))?;

        let mut sealed = [0u8; 65];
        sealed[..64].copy_from_slice(&signature.to_bytes());
        sealed[64] = recovery_id.to_byte();

        let hash_hex = hex::encode(hash);
        let signature_hex = hex::encode(sealed);
        debug!("Hash: {}", hash_hex);
        debug!("Signature: {}", signature_hex);
        Ok((hash_hex, signature_hex))
    }

    pub fn seal(&self, mut block: Block) -> Result<Block, SignerError> {
        let (proofs, signature) = self.sign(&block)?;
        block.seal.proofs = proofs;
        block.seal.signature = signature;
        info!("New independent NVL block signed: {}", block.seal.proofs);
        Ok(block)
    }
}
