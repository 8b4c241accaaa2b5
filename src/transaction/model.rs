use serde::{Deserialize, Serialize};

/// Reward transactions use this sender to mark newly minted coins.
pub const REWARD_SENDER: &str = "0";

/// Block subsidy paid to the mining node.
pub const REWARD_AMOUNT: u64 = 1;

/// A value transfer between two addresses. Immutable once created;
/// no signatures or uniqueness constraints at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

impl Transaction {
    pub fn new(sender: String, recipient: String, amount: u64) -> Self {
        Self {
            sender,
            recipient,
            amount,
        }
    }

    /// Build the reward transaction credited to the node that sealed a block.
    pub fn reward(recipient: String) -> Self {
        Self {
            sender: REWARD_SENDER.to_string(),
            recipient,
            amount: REWARD_AMOUNT,
        }
    }

    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_is_marked_as_minted() {
        let tx = Transaction::reward("node-1".into());
        assert!(tx.is_reward());
        assert_eq!(tx.amount, REWARD_AMOUNT);
    }

    #[test]
    fn regular_transfer_is_not_reward() {
        let tx = Transaction::new("alice".into(), "bob".into(), 5);
        assert!(!tx.is_reward());
    }
}
