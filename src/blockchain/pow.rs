use sha2::{Digest, Sha256};

/// How many hash attempts the search runs between cancellation checks.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Check whether `proof` solves the puzzle posed by the previous block.
///
/// The guess binds the previous proof AND the previous block's digest, so a
/// proof mined on one branch cannot be replayed against a different block
/// that happens to carry the same proof value.
pub fn valid_proof(last_proof: u64, proof: u64, last_hash: &str, difficulty: u32) -> bool {
    let guess = format!("{last_proof}{proof}{last_hash}");
    let mut hasher = Sha256::new();
    hasher.update(guess.as_bytes());
    let guess_hash = hex::encode(hasher.finalize());
    guess_hash
        .chars()
        .take(difficulty as usize)
        .all(|c| c == '0')
}

/// Search for a proof satisfying `valid_proof`, starting from zero.
///
/// Unbounded and CPU-bound (expected 16^difficulty trials), so the caller
/// supplies a cancellation check; the search polls it periodically and
/// returns `None` once it reports true. A chain replacement during consensus
/// resolution makes an in-flight search stale, and continuing it would seal
/// a block whose `previous_hash` no longer matches the head.
pub fn mine(
    last_proof: u64,
    last_hash: &str,
    difficulty: u32,
    cancelled: impl Fn() -> bool,
) -> Option<u64> {
    let mut proof: u64 = 0;
    loop {
        if valid_proof(last_proof, proof, last_hash, difficulty) {
            return Some(proof);
        }
        proof = proof.wrapping_add(1);
        if proof % CANCEL_CHECK_INTERVAL == 0 && cancelled() {
            return None;
        }
    }
}
