use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{AppState, NewTxRequest, NewTxResponse, PendingResponse};
use crate::transaction::Transaction;

/// Submit a new transaction into the pending pool.
/// Missing fields are rejected by deserialization before reaching here;
/// empty addresses and zero amounts are rejected without touching the pool.
#[post("/transactions/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let sender = body.sender.trim();
    let recipient = body.recipient.trim();
    if sender.is_empty() || recipient.is_empty() {
        warn!("POST /transactions/ - rejected: empty sender or recipient");
        return HttpResponse::BadRequest().body("sender and recipient are required");
    }
    if body.amount == 0 {
        warn!("POST /transactions/ - rejected: zero amount");
        return HttpResponse::BadRequest().body("amount must be > 0");
    }

    let tx = Transaction::new(sender.to_string(), recipient.to_string(), body.amount);
    let index = {
        let mut ledger = state.ledger.lock().expect("mutex poisoned");
        ledger.append_transaction(tx)
    };

    info!("POST /transactions/ - queued for block {index}");
    HttpResponse::Created().json(NewTxResponse {
        message: format!("Transaction will be added to block {index}"),
        index,
    })
}

/// List transactions waiting for the next sealed block.
#[get("/pending/")]
pub async fn get_pending(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    let pending = ledger.pending().to_vec();
    HttpResponse::Ok().json(PendingResponse {
        size: pending.len(),
        transactions: pending,
    })
}
