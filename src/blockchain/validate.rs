use log::debug;

use super::{Block, GENESIS_PREVIOUS_HASH, pow};

/// Validate a full chain: genesis shape, linkage, index monotonicity and
/// Proof-of-Work for every consecutive pair.
///
/// Pure function over the supplied slice, so it applies equally to the local
/// chain and to any peer-supplied candidate. A failure anywhere rejects the
/// whole chain; candidates are never partially adopted.
pub fn is_valid_chain(chain: &[Block], difficulty: u32) -> bool {
    let Some(genesis) = chain.first() else {
        return false;
    };
    if genesis.index != 1 || genesis.previous_hash != GENESIS_PREVIOUS_HASH {
        debug!("chain rejected: malformed genesis block");
        return false;
    }

    for pair in chain.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let prev_hash = prev.digest();

        if cur.previous_hash != prev_hash {
            debug!("chain rejected: broken link at index {}", cur.index);
            return false;
        }
        if cur.index != prev.index + 1 {
            debug!("chain rejected: non-monotonic index after {}", prev.index);
            return false;
        }
        if !pow::valid_proof(prev.proof, cur.proof, &prev_hash, difficulty) {
            debug!("chain rejected: invalid proof at index {}", cur.index);
            return false;
        }
    }

    true
}
