// Independent signer for NVL blocks
pub mod chain_state;
pub mod crypto;
pub mod error;
pub mod independent_signer;
pub mod nvl;
pub mod utils;

pub use error::SignerError;
pub use independent_signer::{IndependentSigner, RunOutcome};

/// Version reported to the authority on every enqueued block.
pub fn signer_version() -> String {
    format!("v{}", env!("CARGO_PKG_VERSION"))
}
