use std::fmt;
use std::str::FromStr;

use super::block::Block;

/// What the independent block stores in its `blocks` list for the attested
/// authority block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceMode {
    #[default]
    ProofHash,
    RawJson,
}

impl ReferenceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceMode::ProofHash => "proof-hash",
            ReferenceMode::RawJson => "raw-json",
        }
    }
}

impl fmt::Display for ReferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proof-hash" | "proofhash" | "hash" => Ok(ReferenceMode::ProofHash),
            "raw-json" | "rawjson" | "raw" => Ok(ReferenceMode::RawJson),
            other => Err(format!(
                "unknown reference mode '{other}', expected 'proof-hash' or 'raw-json'"
            )),
        }
    }
}

/// The protocol variant this signer speaks. Historical signer revisions differ
/// on these points, so they are chosen explicitly instead of implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolPolicy {
    pub reference_mode: ReferenceMode,
    /// Copy the authority block's `coiinSupply` into the independent header.
    pub carry_coiin_supply: bool,
}

impl Default for ProtocolPolicy {
    fn default() -> Self {
        Self {
            reference_mode: ReferenceMode::ProofHash,
            carry_coiin_supply: true,
        }
    }
}

impl ProtocolPolicy {
    /// The reference to `block` that goes into the independent block.
    pub fn reference_to(&self, block: &Block) -> String {
        match self.reference_mode {
            ReferenceMode::ProofHash => block.seal.proofs.clone(),
            ReferenceMode::RawJson => block
                .raw()
                .map(str::to_string)
                .unwrap_or_else(|| block.to_json()),
        }
    }

    pub fn coiin_supply_from(&self, block: &Block) -> String {
        if self.carry_coiin_supply {
            block.header.coiin_supply.clone()
        } else {
            String::new()
        }
    }
}
