pub mod block_signer;
pub mod block_verifier;
pub mod keccak;
pub mod key_store;

pub use block_signer::BlockBuilder;
pub use block_verifier::{verify_block, PublicKeyBytes};
pub use keccak::keccak256;
pub use key_store::{KeyStore, Keypair};
