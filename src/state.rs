use crate::store::CounterStore;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub counters: Arc<CounterStore>,
    pub watch_timeout: Duration,
    /// Serializes writes of the data file.
    pub persist_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, counters: CounterStore, watch_timeout: Duration) -> Self {
        Self {
            data_path,
            counters: Arc::new(counters),
            watch_timeout,
            persist_lock: Arc::new(Mutex::new(())),
        }
    }
}
