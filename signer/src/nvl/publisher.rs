use serde::Serialize;
use tracing::{debug, error, info};

use super::block::{Block, BLOCK_VERSION};
use super::canonical::to_authority_json;
use super::client::AuthorityClient;
use crate::error::SignerError;

const ENQUEUE_PATH: &str = "/api/v1/independent/enqueue";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnqueueRequest<'a> {
    version: &'a str,
    block: &'a Block,
    independent_signer_version: &'a str,
}

/// Sends sealed independent blocks to the authority's enqueue endpoint.
pub struct Publisher<'a> {
    client: &'a AuthorityClient,
    signer_version: String,
}

impl<'a> Publisher<'a> {
    pub fn new(client: &'a AuthorityClient, signer_version: String) -> Self {
        Self {
            client,
            signer_version,
        }
    }

    pub async fn publish(&self, block: &Block) -> Result<(), SignerError> {
        info!("Posting new block to NVL");
        let body = to_authority_json(&EnqueueRequest {
            version: BLOCK_VERSION,
            block,
            independent_signer_version: &self.signer_version,
        })
        .map_err(|e| SignerError::protocol("Failed to encode enqueue request", e))?;

        let url = self.client.url(ENQUEUE_PATH);
        debug!("POST {}", url);
        let response = self
            .client
            .http()
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        info!("NVL enqueue response status: {}", status);
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            error!("NVL rejected block {}: {}", block.proof_hash(), body);
            return Err(SignerError::Publish(format!(
                "enqueue failed with status: {}, body: {}",
                status, body
            )));
        }
        Ok(())
    }
}
