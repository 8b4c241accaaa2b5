use std::sync::Mutex;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::blockchain::{Block, Ledger, is_valid_chain};

/// A peer's view of its chain, as served by `GET /api/v1/chain/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub length: usize,
    pub chain: Vec<Block>,
}

/// Result of one consensus pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOutcome {
    /// Whether a longer valid peer chain was adopted.
    pub replaced: bool,
    /// Chain length after resolution.
    pub length: usize,
}

/// Capability to fetch a peer's chain; the resolver's only view of the
/// network, kept as a trait so tests can stand in for the transport.
pub trait PeerClient {
    fn fetch_chain(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<ChainSnapshot, String>> + Send;
}

/// HTTP `PeerClient` speaking this node's own chain endpoint.
#[derive(Clone, Default)]
pub struct HttpPeerClient {
    client: reqwest::Client,
}

impl PeerClient for HttpPeerClient {
    async fn fetch_chain(&self, address: &str) -> Result<ChainSnapshot, String> {
        let url = format!("http://{address}/api/v1/chain/");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("request to {address} failed: {e}"))?;
        if !resp.status().is_success() {
            return Err(format!("{address} answered {}", resp.status()));
        }
        resp.json::<ChainSnapshot>()
            .await
            .map_err(|e| format!("malformed chain from {address}: {e}"))
    }
}

/// Longest-valid-chain consensus over the registered peers.
///
/// All peers are queried concurrently, each under its own timeout, and every
/// response is aggregated: a candidate must be strictly longer than both the
/// local chain and any earlier candidate, and must pass full validation.
/// Unreachable, slow or malformed peers are skipped individually. Only a
/// strictly longer chain wins; an equal-length fork never displaces the
/// local one, which keeps two equally-long forks from oscillating.
pub async fn resolve<C: PeerClient>(
    client: &C,
    peers: &[String],
    timeout: Duration,
    ledger: &Mutex<Ledger>,
) -> ResolveOutcome {
    let (local_len, difficulty) = {
        let ledger = ledger.lock().expect("mutex poisoned");
        (ledger.len(), ledger.difficulty())
    };

    let fetches = peers.iter().map(|addr| async move {
        let result = tokio::time::timeout(timeout, client.fetch_chain(addr))
            .await
            .map_err(|_| format!("{addr} timed out after {timeout:?}"))
            .and_then(|r| r);
        (addr, result)
    });

    let mut best: Option<ChainSnapshot> = None;
    let mut max_len = local_len;

    for (addr, result) in join_all(fetches).await {
        let snapshot = match result {
            Ok(s) => s,
            Err(e) => {
                warn!("consensus: skipping peer {addr}: {e}");
                continue;
            }
        };
        if snapshot.chain.len() <= max_len {
            debug!(
                "consensus: peer {addr} chain ({} blocks) not longer than {max_len}",
                snapshot.chain.len()
            );
            continue;
        }
        if !is_valid_chain(&snapshot.chain, difficulty) {
            warn!("consensus: peer {addr} sent an invalid chain, skipping");
            continue;
        }
        max_len = snapshot.chain.len();
        best = Some(snapshot);
    }

    match best {
        Some(candidate) => {
            let len = candidate.chain.len();
            let mut ledger = ledger.lock().expect("mutex poisoned");
            // Re-check under the lock: the local chain may have grown while
            // peers were being queried.
            if candidate.chain.len() > ledger.len() {
                ledger.replace_chain(candidate.chain);
                info!("consensus: adopted a peer chain of {len} block(s)");
                ResolveOutcome {
                    replaced: true,
                    length: len,
                }
            } else {
                ResolveOutcome {
                    replaced: false,
                    length: ledger.len(),
                }
            }
        }
        None => {
            debug!("consensus: local chain of {local_len} block(s) is authoritative");
            ResolveOutcome {
                replaced: false,
                length: ledger.lock().expect("mutex poisoned").len(),
            }
        }
    }
}

/// Normalize a registered peer address to `host:port`, stripping any scheme
/// prefix and path suffix. Returns `None` for addresses with no host part.
pub fn normalize_peer(address: &str) -> Option<String> {
    let trimmed = address.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);
    let host_port = without_scheme
        .split_once('/')
        .map(|(host, _)| host)
        .unwrap_or(without_scheme);
    if host_port.is_empty() {
        None
    } else {
        Some(host_port.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::blockchain::pow;
    use crate::transaction::Transaction;

    const TEST_DIFFICULTY: u32 = 2;
    const TEST_TIMEOUT: Duration = Duration::from_secs(1);

    /// In-memory `PeerClient` mapping addresses to canned responses.
    struct MockPeerClient {
        responses: HashMap<String, Result<ChainSnapshot, String>>,
    }

    impl MockPeerClient {
        fn new(entries: Vec<(&str, Result<Vec<Block>, String>)>) -> Self {
            let responses = entries
                .into_iter()
                .map(|(addr, r)| {
                    let r = r.map(|chain| ChainSnapshot {
                        length: chain.len(),
                        chain,
                    });
                    (addr.to_string(), r)
                })
                .collect();
            Self { responses }
        }
    }

    impl PeerClient for MockPeerClient {
        async fn fetch_chain(&self, address: &str) -> Result<ChainSnapshot, String> {
            self.responses
                .get(address)
                .cloned()
                .unwrap_or_else(|| Err(format!("unknown peer {address}")))
        }
    }

    fn mined_ledger(extra: usize) -> Ledger {
        let mut ledger = Ledger::new(TEST_DIFFICULTY);
        for i in 0..extra {
            ledger.append_transaction(Transaction::new("alice".into(), "bob".into(), i as u64));
            let last = ledger.last_block();
            let prev_hash = last.digest();
            let proof = pow::mine(last.proof, &prev_hash, TEST_DIFFICULTY, || false).unwrap();
            ledger
                .create_block(proof, Some(prev_hash))
                .expect("seal block");
        }
        ledger
    }

    fn peers(addrs: &[&str]) -> Vec<String> {
        addrs.iter().map(|a| a.to_string()).collect()
    }

    #[tokio::test]
    async fn adopts_only_the_strictly_longer_valid_chain() {
        // Local chain: 3 blocks. Peers offer len 2 (shorter), len 3 (equal)
        // and len 5 (longer, valid) — only the last may win.
        let local = Mutex::new(mined_ledger(2));
        let client = MockPeerClient::new(vec![
            ("short:1", Ok(mined_ledger(1).chain().to_vec())),
            ("equal:1", Ok(mined_ledger(2).chain().to_vec())),
            ("long:1", Ok(mined_ledger(4).chain().to_vec())),
        ]);

        let outcome = resolve(
            &client,
            &peers(&["short:1", "equal:1", "long:1"]),
            TEST_TIMEOUT,
            &local,
        )
        .await;

        assert!(outcome.replaced);
        assert_eq!(outcome.length, 5);
        assert_eq!(local.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn keeps_local_chain_when_no_peer_is_longer() {
        let local = Mutex::new(mined_ledger(2));
        let before = local.lock().unwrap().chain().to_vec();
        let client = MockPeerClient::new(vec![
            ("a:1", Ok(mined_ledger(1).chain().to_vec())),
            ("b:1", Ok(mined_ledger(2).chain().to_vec())),
        ]);

        let outcome = resolve(&client, &peers(&["a:1", "b:1"]), TEST_TIMEOUT, &local).await;

        assert!(!outcome.replaced);
        assert_eq!(outcome.length, 3);
        assert_eq!(local.lock().unwrap().chain(), &before[..]);
    }

    #[tokio::test]
    async fn rejects_longer_but_invalid_chain() {
        let local = Mutex::new(mined_ledger(1));
        let mut forged = mined_ledger(4).chain().to_vec();
        forged[2].transactions.clear();

        let client = MockPeerClient::new(vec![("forger:1", Ok(forged))]);
        let outcome = resolve(&client, &peers(&["forger:1"]), TEST_TIMEOUT, &local).await;

        assert!(!outcome.replaced);
        assert_eq!(local.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn one_failing_peer_does_not_mask_the_others() {
        let local = Mutex::new(mined_ledger(0));
        let client = MockPeerClient::new(vec![
            ("down:1", Err("connection refused".into())),
            ("up:1", Ok(mined_ledger(2).chain().to_vec())),
        ]);

        let outcome = resolve(&client, &peers(&["down:1", "up:1"]), TEST_TIMEOUT, &local).await;

        assert!(outcome.replaced);
        assert_eq!(local.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn no_peers_leaves_chain_untouched() {
        let local = Mutex::new(mined_ledger(1));
        let client = MockPeerClient::new(vec![]);
        let outcome = resolve(&client, &[], TEST_TIMEOUT, &local).await;
        assert!(!outcome.replaced);
        assert_eq!(outcome.length, 2);
    }

    #[test]
    fn normalize_strips_scheme_and_path() {
        assert_eq!(
            normalize_peer("http://192.168.0.5:5000"),
            Some("192.168.0.5:5000".into())
        );
        assert_eq!(
            normalize_peer("https://node.example:8080/api/v1/chain/"),
            Some("node.example:8080".into())
        );
        assert_eq!(
            normalize_peer("  127.0.0.1:8081  "),
            Some("127.0.0.1:8081".into())
        );
        assert_eq!(normalize_peer(""), None);
        assert_eq!(normalize_peer("http:///path"), None);
    }
}
