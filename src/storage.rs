use crate::errors::AppError;
use crate::models::CounterData;
use crate::store::CounterStore;
use std::path::Path;
use tokio::fs;
use tracing::error;

pub async fn load_data(path: &Path) -> CounterData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                CounterData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => CounterData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            CounterData::default()
        }
    }
}

pub async fn load_store(path: &Path) -> CounterStore {
    CounterStore::from_snapshot(load_data(path).await.counters)
}

pub async fn persist_data(path: &Path, data: &CounterData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "vote_widget_storage_{}_{}_{name}",
            std::process::id(),
            nanos
        ))
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let data = load_data(&temp_path("missing.json")).await;
        assert!(data.counters.is_empty());
    }

    #[tokio::test]
    async fn persisted_counters_reload() {
        let path = temp_path("counters.json");
        let store = CounterStore::new();
        store.increment("votes/total");
        store.increment("votes/total");
        store.increment("visitors/total");

        persist_data(&path, &CounterData { counters: store.snapshot() })
            .await
            .unwrap();
        let reloaded = load_store(&path).await;

        assert_eq!(reloaded.get("votes/total"), 2);
        assert_eq!(reloaded.get("visitors/total"), 1);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let path = temp_path("corrupt.json");
        std::fs::write(&path, "{").unwrap();
        assert!(load_data(&path).await.counters.is_empty());
        let _ = std::fs::remove_file(path);
    }
}
