use tracing::{error, info};

use crate::chain_state::ChainState;
use crate::crypto::{verify_block, BlockBuilder, KeyStore, Keypair};
use crate::error::SignerError;
use crate::nvl::{AuthorityClient, Block, Publisher};
use crate::signer_version;
use crate::utils::config::Config;

/// How a run that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NoNewBlock,
    Published { proof_hash: String },
}

/// One pass of the signer: attest the authority's latest block, publish the
/// attestation, then advance the local chain.
pub struct IndependentSigner {
    config: Config,
    key_store: KeyStore,
    chain_state: ChainState,
}

impl IndependentSigner {
    pub fn new(config: Config) -> Result<Self, SignerError> {
        config.prepare_data_dir()?;
        let key_store = KeyStore::new(config.data_dir());
        let chain_state = ChainState::new(config.data_dir());
        Ok(Self {
            config,
            key_store,
            chain_state,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Loads or creates the signing key without touching the network.
    pub fn public_key(&self) -> Result<String, SignerError> {
        Ok(self.key_store.load()?.public_key_hex())
    }

    pub async fn run(&self) -> Result<RunOutcome, SignerError> {
        let keypair = self.key_store.load()?;
        let client = AuthorityClient::new(&self.config.nvl_base_url, self.config.http_timeout)?;

        let verifying_key = client.fetch_verifying_key().await?;
        info!("NVL verifying key: {}", verifying_key.to_hex());

        let Some(latest) = client.fetch_latest_block().await? else {
            info!("No new NVL block, nothing to sign");
            return Ok(RunOutcome::NoNewBlock);
        };

        info!("Verifying NVL block {}", latest.proof_hash());
        if !verify_block(&verifying_key, &latest)? {
            error!(
                "NVL block {} is not signed by the NVL verifying key {}",
                latest.proof_hash(),
                verifying_key.to_hex()
            );
            return Err(SignerError::VerificationFailure(format!(
                "block {} does not verify against the NVL verifying key",
                latest.proof_hash()
            )));
        }
        info!("NVL block verified");

        self.attest(&keypair, &client, &latest).await
    }

    async fn attest(
        &self,
        keypair: &Keypair,
        client: &AuthorityClient,
        latest: &Block,
    ) -> Result<RunOutcome, SignerError> {
        let prior = self.chain_state.load_prior_hash()?;

        let builder = BlockBuilder::new(keypair, self.config.policy);
        let block = builder.build(latest, prior.hash(), chrono::Utc::now().timestamp());
        let block = builder.seal(block)?;

        Publisher::new(client, signer_version())
            .publish(&block)
            .await?;
        info!("Independent block {} published", block.proof_hash());

        prior.save(block.proof_hash())?;
        Ok(RunOutcome::Published {
            proof_hash: block.proof_hash().to_string(),
        })
    }
}
