pub mod block;
pub mod model;
pub mod pow;
pub mod validate;

pub use block::Block;
pub use model::Ledger;
pub use validate::is_valid_chain;

/// Default Proof-of-Work difficulty (leading zero hex chars, 4 = 16 bits).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// `previous_hash` sentinel carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Fixed proof value sealed into the genesis block.
pub const GENESIS_PROOF: u64 = 100;
