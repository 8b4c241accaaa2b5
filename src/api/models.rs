use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use crate::blockchain::{Block, DEFAULT_DIFFICULTY, Ledger};
use crate::consensus::HttpPeerClient;
use crate::transaction::Transaction;

/// Shared application state: the ledger, the registered peer set and this
/// node's identity.
pub struct AppState {
    pub ledger: Mutex<Ledger>,
    pub peers: Mutex<HashSet<String>>,
    /// Reward recipient for blocks this node seals.
    pub node_id: String,
    /// Bumped whenever the chain is replaced; in-flight mining snapshots it
    /// and aborts once it moves.
    pub chain_epoch: AtomicU64,
    pub peer_client: HttpPeerClient,
    pub peer_timeout: Duration,
}

impl AppState {
    pub fn new(difficulty: u32, peer_timeout: Duration) -> Self {
        let node_id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            ledger: Mutex::new(Ledger::new(difficulty)),
            peers: Mutex::new(HashSet::new()),
            node_id,
            chain_epoch: AtomicU64::new(0),
            peer_client: HttpPeerClient::default(),
            peer_timeout,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY, Duration::from_secs(3))
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub chain: &'a [Block],
    pub length: usize,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub message: &'static str,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct NewTxRequest {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub message: String,
    pub index: u64,
}

#[derive(Serialize)]
pub struct PendingResponse {
    pub size: usize,
    pub transactions: Vec<Transaction>,
}

/* ---------- Node registry / Consensus API Models ---------- */

#[derive(Deserialize)]
pub struct RegisterNodesRequest {
    pub nodes: Vec<String>,
}

#[derive(Serialize)]
pub struct RegisterNodesResponse {
    pub message: &'static str,
    pub total_nodes: Vec<String>,
}

#[derive(Serialize)]
pub struct NodesResponse {
    pub nodes: Vec<String>,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub message: &'static str,
    pub chain: Vec<Block>,
    pub length: usize,
}
