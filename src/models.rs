use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What the counter service keeps on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CounterData {
    pub counters: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CounterResponse {
    pub path: String,
    pub value: u64,
}

#[derive(Debug, Deserialize, Default)]
pub struct WatchQuery {
    pub after: Option<u64>,
    /// Seconds the caller is willing to wait for a change.
    pub wait: Option<u64>,
}
