use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};
use std::sync::atomic::Ordering;

use super::models::{AppState, NodesResponse, RegisterNodesRequest, RegisterNodesResponse, ResolveResponse};
use crate::consensus::{self, normalize_peer};

/// Register peer nodes. Addresses are normalized to `host:port` (scheme and
/// path stripped) and deduplicated; a request with no usable address is
/// rejected.
#[post("/nodes/register/")]
pub async fn register_nodes(
    state: web::Data<AppState>,
    body: web::Json<RegisterNodesRequest>,
) -> impl Responder {
    if body.nodes.is_empty() {
        return HttpResponse::BadRequest().body("please supply a non-empty list of nodes");
    }

    let normalized: Vec<String> = body.nodes.iter().filter_map(|n| normalize_peer(n)).collect();
    if normalized.is_empty() {
        warn!("POST /nodes/register/ - no valid address in {:?}", body.nodes);
        return HttpResponse::BadRequest().body("no valid node address supplied");
    }

    let total_nodes = {
        let mut peers = state.peers.lock().expect("mutex poisoned");
        for addr in normalized {
            peers.insert(addr);
        }
        let mut all: Vec<String> = peers.iter().cloned().collect();
        all.sort();
        all
    };

    info!(
        "POST /nodes/register/ - peer set now has {} node(s)",
        total_nodes.len()
    );
    HttpResponse::Created().json(RegisterNodesResponse {
        message: "New nodes have been added",
        total_nodes,
    })
}

/// List the registered peer set.
#[get("/nodes/")]
pub async fn get_nodes(state: web::Data<AppState>) -> impl Responder {
    let peers = state.peers.lock().expect("mutex poisoned");
    let mut nodes: Vec<String> = peers.iter().cloned().collect();
    nodes.sort();
    HttpResponse::Ok().json(NodesResponse { nodes })
}

/// Run longest-valid-chain consensus against all registered peers and
/// report whether the local chain was replaced.
#[get("/nodes/resolve/")]
pub async fn resolve_conflicts(state: web::Data<AppState>) -> impl Responder {
    let peers: Vec<String> = {
        let peers = state.peers.lock().expect("mutex poisoned");
        peers.iter().cloned().collect()
    };

    let outcome = consensus::resolve(
        &state.peer_client,
        &peers,
        state.peer_timeout,
        &state.ledger,
    )
    .await;

    if outcome.replaced {
        // Invalidate any Proof-of-Work search running against the old head.
        state.chain_epoch.fetch_add(1, Ordering::SeqCst);
    }

    let chain = {
        let ledger = state.ledger.lock().expect("mutex poisoned");
        ledger.chain().to_vec()
    };
    let message = if outcome.replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    info!(
        "GET /nodes/resolve/ - {} ({} block(s), {} peer(s) queried)",
        message,
        outcome.length,
        peers.len()
    );
    HttpResponse::Ok().json(ResolveResponse {
        message,
        length: chain.len(),
        chain,
    })
}
