use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::block::Block;
use crate::crypto::PublicKeyBytes;
use crate::error::SignerError;

const STATUS_PATH: &str = "/api/v1/status";
const LATEST_BLOCK_PATH: &str = "/api/v1/blocks?size=1";
const BLOCKS_PATH: &str = "/api/v1/blocks";

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(rename = "publicKey", alias = "PublicKey", default)]
    public_key: String,
}

#[derive(Deserialize)]
struct BlockListing {
    #[serde(alias = "Blocks", default)]
    blocks: Option<Vec<BlockSummary>>,
}

#[derive(Deserialize)]
struct BlockSummary {
    #[serde(alias = "Hash", default)]
    hash: String,
}

/// Read side of the NVL authority's HTTP API.
pub struct AuthorityClient {
    client: reqwest::Client,
    base_url: String,
}

impl AuthorityClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SignerError> {
        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(SignerError::Config("NVL base URL is empty".to_string()));
        }
        reqwest::Url::parse(base_url)
            .map_err(|e| SignerError::Config(format!("Invalid NVL base URL {base_url}: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SignerError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn fetch_verifying_key(&self) -> Result<PublicKeyBytes, SignerError> {
        info!("Loading NVL verifying key");
        let body = self.get_text(STATUS_PATH).await?;
        let status: StatusResponse = serde_json::from_str(&body)
            .map_err(|e| SignerError::protocol("Malformed status response", e))?;
        PublicKeyBytes::from_hex(&status.public_key)
    }

    /// Hash of the newest authority block, `None` unless exactly one is listed.
    pub async fn fetch_latest_block_hash(&self) -> Result<Option<String>, SignerError> {
        let body = self.get_text(LATEST_BLOCK_PATH).await?;
        let listing: BlockListing = serde_json::from_str(&body)
            .map_err(|e| SignerError::protocol("Malformed block listing", e))?;

        let mut blocks = listing.blocks.unwrap_or_default();
        if blocks.len() != 1 {
            debug!("Block listing returned {} entries", blocks.len());
            info!("NVL did not return any blocks to sign");
            return Ok(None);
        }
        Ok(blocks.pop().map(|summary| summary.hash))
    }

    /// Fetches one block by hash, keeping the response body it was parsed from.
    pub async fn fetch_block(&self, hash: &str) -> Result<Block, SignerError> {
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SignerError::Protocol(format!(
                "Block hash '{hash}' is not a hex string"
            )));
        }

        let body = self
            .get_text(&format!("{BLOCKS_PATH}/{hash}?raw=true"))
            .await?;
        let block = Block::from_raw(body)
            .map_err(|e| SignerError::protocol(&format!("Malformed block {hash}"), e))?;
        info!("Latest NVL block hash: {}", block.proof_hash());
        Ok(block)
    }

    pub async fn fetch_latest_block(&self) -> Result<Option<Block>, SignerError> {
        info!("Fetching latest NVL block");
        match self.fetch_latest_block_hash().await? {
            Some(hash) => self.fetch_block(&hash).await.map(Some),
            None => Ok(None),
        }
    }

    async fn get_text(&self, path: &str) -> Result<String, SignerError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SignerError::Protocol(format!(
                "Request ({}) failed with status: {}, body: {}",
                path, status, body
            )));
        }
        Ok(body)
    }
}
