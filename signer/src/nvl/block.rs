use serde::{Deserialize, Deserializer, Serialize};

use super::canonical;

pub const BLOCK_VERSION: &str = "1";
const INDEPENDENT: &str = "INDEPENDENT";

/// Origin of a block. Authority blocks keep whatever type string they were
/// served with, since it is part of the signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockType {
    Independent,
    Authority(String),
}

impl BlockType {
    pub fn as_str(&self) -> &str {
        match self {
            BlockType::Independent => INDEPENDENT,
            BlockType::Authority(name) => name,
        }
    }
}

impl Default for BlockType {
    fn default() -> Self {
        BlockType::Authority(String::new())
    }
}

impl From<String> for BlockType {
    fn from(value: String) -> Self {
        if value == INDEPENDENT {
            BlockType::Independent
        } else {
            BlockType::Authority(value)
        }
    }
}

impl From<BlockType> for String {
    fn from(value: BlockType) -> Self {
        match value {
            BlockType::Independent => INDEPENDENT.to_string(),
            BlockType::Authority(name) => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    #[serde(rename = "type", default)]
    pub block_type: BlockType,
    #[serde(default)]
    pub prior_block: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub public_key: String,
    /// Decimal, empty when the authority did not report one.
    #[serde(default)]
    pub coiin_supply: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSeal {
    #[serde(default)]
    pub proofs: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
}

impl BlockSeal {
    #[cfg(test)]
    pub(crate) fn is_sealed(&self) -> bool {
        !self.proofs.is_empty() && !self.signature.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub version: String,
    pub header: BlockHeader,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub blocks: Vec<String>,
    #[serde(rename = "signature", default)]
    pub seal: BlockSeal,
    /// Response body this block was parsed from, if it was fetched.
    #[serde(skip)]
    raw: Option<String>,
}

impl Block {
    pub fn new(header: BlockHeader, blocks: Vec<String>) -> Self {
        Self {
            version: BLOCK_VERSION.to_string(),
            header,
            blocks,
            seal: BlockSeal::default(),
            raw: None,
        }
    }

    /// Parses a served block and keeps the served text next to it.
    pub fn from_raw(raw: String) -> Result<Self, serde_json::Error> {
        let mut block: Block = serde_json::from_str(&raw)?;
        block.raw = Some(raw);
        Ok(block)
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn proof_hash(&self) -> &str {
        &self.seal.proofs
    }

    #[cfg(test)]
    pub(crate) fn is_independent(&self) -> bool {
        self.header.block_type == BlockType::Independent
    }

    /// JSON form of the whole block, seal included, in the authority's dialect.
    pub fn to_json(&self) -> String {
        canonical::to_authority_json_string(self)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
