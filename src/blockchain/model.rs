use log::{debug, info};

use super::{Block, validate};
use crate::transaction::Transaction;

/// In-memory replicated ledger: the authoritative chain plus the pool of
/// transactions awaiting inclusion in the next sealed block.
///
/// All mutation goes through `&mut self`; callers serialize access with a
/// single mutex so no reader ever observes a half-applied mutation.
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    difficulty: u32,
}

impl Ledger {
    /// Initialize a ledger holding only the genesis block.
    pub fn new(difficulty: u32) -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending: Vec::new(),
            difficulty,
        }
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger always holds at least the genesis block")
    }

    /// Queue a transaction for the next sealed block and return the index
    /// that block will carry.
    pub fn append_transaction(&mut self, tx: Transaction) -> u64 {
        self.pending.push(tx);
        self.last_block().index + 1
    }

    /// Seal the pending pool into a new block linked to the current head.
    ///
    /// `previous_hash`, when supplied, must match the head's digest — a
    /// mismatch means the caller mined against a stale head (the chain was
    /// replaced mid-search) and nothing is mutated. The chain append and the
    /// pool clear happen under the same exclusive borrow, so they are
    /// observed as one atomic step.
    pub fn create_block(
        &mut self,
        proof: u64,
        previous_hash: Option<String>,
    ) -> Result<&Block, &'static str> {
        let head_hash = self.last_block().digest();
        let previous_hash = match previous_hash {
            Some(h) if h != head_hash => {
                return Err("previous_hash does not match the current chain head");
            }
            Some(h) => h,
            None => head_hash,
        };

        let block = Block::new(
            self.last_block().index + 1,
            std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        );
        info!(
            "sealed block #{} with {} transaction(s)",
            block.index,
            block.transactions.len()
        );
        self.chain.push(block);
        Ok(self.last_block())
    }

    /// Validate the local chain.
    pub fn is_valid(&self) -> bool {
        validate::is_valid_chain(&self.chain, self.difficulty)
    }

    /// Swap in a replacement chain wholesale, discarding the old one.
    ///
    /// The caller is responsible for having validated the candidate. Pending
    /// transactions survive the swap and will be retried in the next sealed
    /// block.
    pub fn replace_chain(&mut self, new_chain: Vec<Block>) {
        debug!(
            "replacing chain: {} -> {} block(s)",
            self.chain.len(),
            new_chain.len()
        );
        self.chain = new_chain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{GENESIS_PREVIOUS_HASH, pow};

    const TEST_DIFFICULTY: u32 = 2;

    fn mine_next(ledger: &mut Ledger) {
        let last = ledger.last_block();
        let prev_hash = last.digest();
        let proof = pow::mine(last.proof, &prev_hash, TEST_DIFFICULTY, || false).unwrap();
        ledger
            .create_block(proof, Some(prev_hash))
            .expect("seal block");
    }

    #[test]
    fn fresh_ledger_holds_only_genesis() {
        let ledger = Ledger::new(TEST_DIFFICULTY);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.last_block().index, 1);
        assert_eq!(ledger.last_block().previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn append_transaction_returns_next_index() {
        let mut ledger = Ledger::new(TEST_DIFFICULTY);
        let idx = ledger.append_transaction(Transaction::new("alice".into(), "bob".into(), 1));
        assert_eq!(idx, 2);
        assert_eq!(ledger.pending().len(), 1);
    }

    #[test]
    fn seal_drains_pool_in_submission_order() {
        let mut ledger = Ledger::new(TEST_DIFFICULTY);
        for i in 0..4u64 {
            ledger.append_transaction(Transaction::new(format!("s{i}"), "bob".into(), i));
        }
        mine_next(&mut ledger);

        let sealed = ledger.last_block();
        assert_eq!(sealed.index, 2);
        assert_eq!(sealed.transactions.len(), 4);
        for (i, tx) in sealed.transactions.iter().enumerate() {
            assert_eq!(tx.sender, format!("s{i}"));
        }
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn stale_previous_hash_is_rejected_without_mutation() {
        let mut ledger = Ledger::new(TEST_DIFFICULTY);
        ledger.append_transaction(Transaction::new("alice".into(), "bob".into(), 1));

        let err = ledger.create_block(0, Some("stale".into())).unwrap_err();
        assert!(err.contains("previous_hash"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pending().len(), 1);
    }

    #[test]
    fn omitted_previous_hash_is_computed() {
        let mut ledger = Ledger::new(TEST_DIFFICULTY);
        let head_hash = ledger.last_block().digest();
        let proof = pow::mine(100, &head_hash, TEST_DIFFICULTY, || false).unwrap();
        let block = ledger.create_block(proof, None).unwrap();
        assert_eq!(block.previous_hash, head_hash);
        assert!(ledger.is_valid());
    }

    #[test]
    fn mined_chain_stays_valid() {
        let mut ledger = Ledger::new(TEST_DIFFICULTY);
        for _ in 0..3 {
            ledger.append_transaction(Transaction::new("alice".into(), "bob".into(), 2));
            mine_next(&mut ledger);
        }
        assert_eq!(ledger.len(), 4);
        assert!(ledger.is_valid());
    }

    #[test]
    fn replace_chain_keeps_pending_pool() {
        let mut donor = Ledger::new(TEST_DIFFICULTY);
        mine_next(&mut donor);
        let longer = donor.chain().to_vec();

        let mut ledger = Ledger::new(TEST_DIFFICULTY);
        ledger.append_transaction(Transaction::new("alice".into(), "bob".into(), 3));
        ledger.replace_chain(longer);

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.pending().len(), 1);
    }
}
