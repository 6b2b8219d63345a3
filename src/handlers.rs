use crate::errors::AppError;
use crate::models::{CounterData, CounterResponse, WatchQuery};
use crate::state::AppState;
use crate::storage::persist_data;
use crate::store::counter_path;
use crate::ui::{APP_SCRIPT, DATABASE_SCRIPT, render_index};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse},
};
use std::time::Duration;
use tracing::{debug, error, info};

pub async fn index() -> Html<String> {
    Html(render_index())
}

pub async fn app_script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], APP_SCRIPT)
}

pub async fn database_script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], DATABASE_SCRIPT)
}

/// Reads a counter. With `after` equal to the current value, holds the request
/// until the value changes or the wait runs out.
pub async fn get_counter(
    State(state): State<AppState>,
    Path((group, name)): Path<(String, String)>,
    Query(query): Query<WatchQuery>,
) -> Result<Json<CounterResponse>, AppError> {
    let path = counter_path(&group, &name)?;
    let value = match query.after {
        Some(after) => {
            let wait = query
                .wait
                .map(Duration::from_secs)
                .map_or(state.watch_timeout, |wait| wait.min(state.watch_timeout));
            wait_for_change(&state, &path, after, wait).await
        }
        None => state.counters.get(&path),
    };

    Ok(Json(CounterResponse { path, value }))
}

async fn wait_for_change(state: &AppState, path: &str, after: u64, wait: Duration) -> u64 {
    let mut rx = state.counters.watch(path);
    let mut value = *rx.borrow_and_update();
    if value == after {
        debug!(path, after, ?wait, "waiting for change");
        if let Ok(Ok(())) = tokio::time::timeout(wait, rx.changed()).await {
            value = *rx.borrow_and_update();
        }
    }
    drop(rx);
    state.counters.release(path);
    value
}

/// Increments a counter. The new value is committed before the data file is
/// written; a failed write is logged and the committed value is still returned.
pub async fn increment_counter(
    State(state): State<AppState>,
    Path((group, name)): Path<(String, String)>,
) -> Result<Json<CounterResponse>, AppError> {
    let path = counter_path(&group, &name)?;
    let value = state.counters.increment(&path);
    info!(path = %path, value, "counter incremented");

    {
        let _guard = state.persist_lock.lock().await;
        let data = CounterData {
            counters: state.counters.snapshot(),
        };
        if let Err(err) = persist_data(&state.data_path, &data).await {
            error!(path = %state.data_path.display(), "failed to persist counters: {}", err.message);
        }
    }

    Ok(Json(CounterResponse { path, value }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CounterStore;

    fn state_at(data_path: std::path::PathBuf) -> AppState {
        AppState::new(data_path, CounterStore::new(), Duration::from_secs(1))
    }

    fn votes() -> Path<(String, String)> {
        Path(("votes".to_string(), "total".to_string()))
    }

    #[tokio::test]
    async fn unwritable_data_file_still_reports_committed_value() {
        // a directory cannot be written as a file
        let state = state_at(std::env::temp_dir());

        let first = increment_counter(State(state.clone()), votes()).await.unwrap();
        let second = increment_counter(State(state.clone()), votes()).await.unwrap();

        assert_eq!(first.0.value, 1);
        assert_eq!(second.0.value, 2);
        assert_eq!(state.counters.get("votes/total"), second.0.value);
    }

    #[tokio::test]
    async fn reading_unwritten_paths_tracks_nothing() {
        let state = state_at(std::env::temp_dir());

        for i in 0..500 {
            let path = Path(("junk".to_string(), format!("p{i}")));
            let read = get_counter(State(state.clone()), path, Query(WatchQuery::default()))
                .await
                .unwrap();
            assert_eq!(read.0.value, 0);
        }
        let watched = get_counter(
            State(state.clone()),
            Path(("junk".to_string(), "waited".to_string())),
            Query(WatchQuery {
                after: Some(0),
                wait: Some(0),
            }),
        )
        .await
        .unwrap();

        assert_eq!(watched.0.value, 0);
        assert_eq!(state.counters.tracked(), 0);
    }

    #[tokio::test]
    async fn stale_after_answers_without_waiting() {
        let state = state_at(std::env::temp_dir());
        state.counters.increment("votes/total");

        let read = get_counter(
            State(state.clone()),
            votes(),
            Query(WatchQuery {
                after: Some(0),
                wait: Some(60),
            }),
        )
        .await
        .unwrap();

        assert_eq!(read.0.value, 1);
    }
}
