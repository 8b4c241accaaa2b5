use actix_web::{HttpResponse, Responder, get, web};
use log::{info, warn};
use std::sync::atomic::Ordering;

use super::models::{AppState, ChainResponse, MineResponse, ValidateResponse};
use crate::blockchain::pow;
use crate::transaction::Transaction;

/// Get the full chain and its length.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    let resp = ChainResponse {
        chain: ledger.chain(),
        length: ledger.len(),
    };
    HttpResponse::Ok().json(resp)
}

/// Validate the whole local chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    let resp = ValidateResponse {
        valid: ledger.is_valid(),
        length: ledger.len(),
    };
    HttpResponse::Ok().json(resp)
}

/// Mine the next block:
/// - Snapshot the head (proof + digest) under the lock, then release it
/// - Run the Proof-of-Work search on a blocking thread, aborting if the
///   chain epoch moves (consensus replaced the chain mid-search)
/// - Append the reward transaction and seal the pending pool; the ledger
///   re-checks the head digest, so a stale proof is rejected, not sealed
#[get("/mine/")]
pub async fn mine_block(state: web::Data<AppState>) -> impl Responder {
    let (last_proof, prev_hash, difficulty) = {
        let ledger = state.ledger.lock().expect("mutex poisoned");
        let last = ledger.last_block();
        (last.proof, last.digest(), ledger.difficulty())
    };

    let epoch = state.chain_epoch.load(Ordering::SeqCst);
    let search_state = state.clone();
    let search_hash = prev_hash.clone();
    let mined = web::block(move || {
        pow::mine(last_proof, &search_hash, difficulty, || {
            search_state.chain_epoch.load(Ordering::SeqCst) != epoch
        })
    })
    .await;

    let proof = match mined {
        Ok(Some(proof)) => proof,
        Ok(None) => {
            warn!("MINER - search aborted, chain replaced by consensus");
            return HttpResponse::Conflict().body("chain replaced while mining");
        }
        Err(_) => return HttpResponse::InternalServerError().body("mining task failed"),
    };

    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    // Head may have moved between the search finishing and this lock.
    if ledger.last_block().digest() != prev_hash {
        warn!("MINER - head moved before sealing, proof discarded");
        return HttpResponse::Conflict().body("chain head changed while mining");
    }

    // Reward goes in after the search and before the seal, so it lands in
    // the block being forged.
    ledger.append_transaction(Transaction::reward(state.node_id.clone()));
    match ledger.create_block(proof, Some(prev_hash)) {
        Ok(block) => {
            let resp = MineResponse {
                message: "New block forged",
                index: block.index,
                transactions: block.transactions.clone(),
                proof: block.proof,
                previous_hash: block.previous_hash.clone(),
            };
            info!("MINER - forged block #{} (proof={})", resp.index, resp.proof);
            HttpResponse::Ok().json(resp)
        }
        Err(msg) => HttpResponse::Conflict().body(msg),
    }
}
