use crate::config::StoreConfig;
use crate::errors::RemoteError;
use crate::models::CounterResponse;
use crate::store::{CounterStore, check_path};
use std::{future::Future, sync::Arc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Receives every value pushed for a subscribed counter.
pub type OnUpdate = Box<dyn Fn(u64) + Send + Sync>;

/// Client side of one shared counter store.
pub trait RemoteCounterClient: Send + Sync {
    /// Registers `on_update` for `path`. It fires with the current value (0 if
    /// never written) and again on every later change.
    fn subscribe(&self, path: &str, on_update: OnUpdate) -> Result<Subscription, RemoteError>;

    /// Atomically replaces the value at `path` with `(current or 0) + 1` and returns it.
    fn increment(&self, path: &str) -> impl Future<Output = Result<u64, RemoteError>> + Send;
}

/// A running push stream. Dropping the handle leaves the stream running.
pub struct Subscription {
    path: String,
    task: JoinHandle<()>,
}

impl Subscription {
    fn new(path: &str, task: JoinHandle<()>) -> Self {
        Self {
            path: path.to_string(),
            task,
        }
    }

    pub fn cancel(&self) {
        debug!(path = %self.path, "cancelling subscription");
        self.task.abort();
    }
}

/// Talks to a [`CounterStore`] living in the same process.
#[derive(Clone)]
pub struct LocalCounterClient {
    store: Arc<CounterStore>,
}

impl LocalCounterClient {
    pub fn new(store: Arc<CounterStore>) -> Self {
        Self { store }
    }
}

impl RemoteCounterClient for LocalCounterClient {
    fn subscribe(&self, path: &str, on_update: OnUpdate) -> Result<Subscription, RemoteError> {
        check_path(path)?;
        let mut rx = self.store.watch(path);
        let current = *rx.borrow_and_update();
        on_update(current);

        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let value = *rx.borrow_and_update();
                on_update(value);
            }
        });
        Ok(Subscription::new(path, task))
    }

    async fn increment(&self, path: &str) -> Result<u64, RemoteError> {
        check_path(path)?;
        Ok(self.store.increment(path))
    }
}

/// Talks to the counter store HTTP service.
///
/// Live updates are long polls: each request names the last value seen and the
/// server answers once the value differs or its wait runs out.
#[derive(Clone)]
pub struct HttpCounterClient {
    config: StoreConfig,
    http: reqwest::Client,
}

impl HttpCounterClient {
    pub fn connect(config: StoreConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, http })
    }

    fn counter_url(&self, path: &str) -> Result<String, RemoteError> {
        check_path(path)?;
        Ok(format!("{}/api/counters/{path}", self.config.base_url))
    }

    /// Reads `path`. With `after`, waits for a value different from it.
    pub async fn read(&self, path: &str, after: Option<u64>) -> Result<u64, RemoteError> {
        let url = self.counter_url(path)?;
        let mut request = self.http.get(url);
        if let Some(after) = after {
            let wait = self.config.watch_wait;
            request = request
                .query(&[("after", after), ("wait", wait.as_secs())])
                .timeout(wait + self.config.request_timeout);
        }
        let response = request.send().await?;
        parse_counter(path, response).await
    }
}

impl RemoteCounterClient for HttpCounterClient {
    fn subscribe(&self, path: &str, on_update: OnUpdate) -> Result<Subscription, RemoteError> {
        check_path(path)?;
        let client = self.clone();
        let owned_path = path.to_string();

        let task = tokio::spawn(async move {
            let mut last = None;
            loop {
                match client.read(&owned_path, last).await {
                    Ok(value) => {
                        if last != Some(value) {
                            on_update(value);
                        }
                        last = Some(value);
                    }
                    Err(err) => {
                        warn!(path = %owned_path, "live update failed, retrying: {err}");
                        tokio::time::sleep(client.config.retry_delay).await;
                    }
                }
            }
        });
        Ok(Subscription::new(path, task))
    }

    async fn increment(&self, path: &str) -> Result<u64, RemoteError> {
        let url = format!("{}/increment", self.counter_url(path)?);
        let response = self.http.post(url).send().await?;
        parse_counter(path, response).await
    }
}

async fn parse_counter(path: &str, response: reqwest::Response) -> Result<u64, RemoteError> {
    let status = response.status();
    if !status.is_success() {
        return Err(RemoteError::Status {
            path: path.to_string(),
            status: status.as_u16(),
        });
    }
    let body: CounterResponse = response.json().await?;
    if body.path != path {
        return Err(RemoteError::Rejected(format!(
            "asked for '{path}', got '{}'",
            body.path
        )));
    }
    Ok(body.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    fn recorder() -> (Arc<Mutex<Vec<u64>>>, OnUpdate) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, Box::new(move |value| sink.lock().push(value)))
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn subscribe_fires_immediately_with_zero() {
        let client = LocalCounterClient::new(Arc::new(CounterStore::new()));
        let (seen, on_update) = recorder();
        let _sub = client.subscribe("votes/total", on_update).unwrap();
        assert_eq!(*seen.lock(), vec![0]);
    }

    #[tokio::test]
    async fn subscribe_follows_increments() {
        let store = Arc::new(CounterStore::new());
        let client = LocalCounterClient::new(Arc::clone(&store));
        let (seen, on_update) = recorder();
        let _sub = client.subscribe("votes/total", on_update).unwrap();

        assert_eq!(client.increment("votes/total").await.unwrap(), 1);
        settle().await;
        assert_eq!(seen.lock().last(), Some(&1));
    }

    #[tokio::test]
    async fn cancelled_subscription_stops_pushing() {
        let store = Arc::new(CounterStore::new());
        let client = LocalCounterClient::new(Arc::clone(&store));
        let (seen, on_update) = recorder();
        let sub = client.subscribe("votes/total", on_update).unwrap();

        sub.cancel();
        settle().await;
        store.increment("votes/total");
        settle().await;
        assert_eq!(*seen.lock(), vec![0]);
    }

    #[tokio::test]
    async fn invalid_path_is_rejected_before_io() {
        let client = HttpCounterClient::connect(StoreConfig {
            request_timeout: Duration::from_millis(50),
            ..StoreConfig::new("http://127.0.0.1:9")
        })
        .unwrap();
        assert!(matches!(
            client.increment("votes").await,
            Err(RemoteError::InvalidPath(_))
        ));
        let (_, on_update) = recorder();
        assert!(client.subscribe("a/b/c", on_update).is_err());
    }
}
