pub mod block;
pub mod canonical;
pub mod client;
pub mod protocol;
pub mod publisher;

pub use block::{Block, BlockHeader, BlockSeal, BlockType};
pub use client::AuthorityClient;
pub use protocol::{ProtocolPolicy, ReferenceMode};
pub use publisher::Publisher;
