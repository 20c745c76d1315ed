use chrono::{DateTime, Utc};

/// Snapshot of a node's identity, sync and validator state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeStatus {
    /// Hex-encoded node ID (`node_info.id`).
    pub node_id: String,
    /// Operator-chosen display name (`node_info.moniker`).
    pub moniker: String,
    pub catching_up: bool,
    /// Voting power of this node's validator key; 0 if it is not a validator.
    pub voting_power: i64,
    pub latest_block_height: i64,
    pub latest_block_time: DateTime<Utc>,
}

impl NodeStatus {
    /// Seconds elapsed between the latest block and `now`.
    ///
    /// Negative if the node's clock (or block time) is ahead of `now`.
    pub fn seconds_since_latest_block(&self, now: DateTime<Utc>) -> f64 {
        (now - self.latest_block_time).num_milliseconds() as f64 / 1_000.0
    }
}
