use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::transaction::Transaction;

/// A single block in the chain. Immutable after creation; carries the
/// digest of its predecessor rather than caching its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    /// Unix timestamp (UTC seconds).
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    /// Proof-of-Work solution mined against the previous block.
    pub proof: u64,
    /// Digest of the block at `index - 1`, or the genesis sentinel.
    pub previous_hash: String,
}

impl Block {
    /// Create the genesis block (first block in the chain).
    pub fn genesis() -> Self {
        Self {
            index: 1,
            timestamp: Utc::now().timestamp(),
            transactions: Vec::new(),
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        }
    }

    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
    ) -> Self {
        Self {
            index,
            timestamp: Utc::now().timestamp(),
            transactions,
            proof,
            previous_hash,
        }
    }

    /// SHA-256 digest over the canonical serialization of this block.
    ///
    /// The block is rendered through `serde_json::Value`, whose object map
    /// keeps keys in lexicographic order, so the preimage is independent of
    /// struct field order and identical on every node. Numeric fields carry
    /// a fixed integer encoding. A non-serializable block is a programmer
    /// error and panics rather than producing a wrong digest.
    pub fn digest(&self) -> String {
        let canonical = serde_json::to_value(self).expect("serialize block");
        let preimage = serde_json::to_string(&canonical).expect("render canonical block");
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        hex::encode(hasher.finalize())
    }
}
