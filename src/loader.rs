use crate::errors::LoadError;
use std::future::Future;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Makes sure the counter store client capability is present before a client is built.
pub trait ResourceLoader: Send + Sync {
    fn ensure_loaded(&self) -> impl Future<Output = Result<(), LoadError>> + Send;
}

/// The capability is already part of the runtime; nothing to fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preloaded;

impl ResourceLoader for Preloaded {
    async fn ensure_loaded(&self) -> Result<(), LoadError> {
        Ok(())
    }
}

/// Retrieves one resource.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<(), LoadError>> + Send;
}

#[derive(Clone, Default)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<(), LoadError> {
        let failed = |reason: String| LoadError::Fetch {
            url: url.to_string(),
            reason,
        };
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| failed(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("status {status}")));
        }
        let body = response.bytes().await.map_err(|err| failed(err.to_string()))?;
        debug!(url, bytes = body.len(), "resource fetched");
        Ok(())
    }
}

/// Fetches an ordered list of resources once.
///
/// Callers arriving while a load is in flight wait for that load instead of
/// starting their own. A failed load is not remembered.
pub struct ScriptLoader<F> {
    resources: Vec<String>,
    fetcher: F,
    loaded: OnceCell<()>,
}

impl<F: Fetch> ScriptLoader<F> {
    pub fn new(resources: Vec<String>, fetcher: F) -> Self {
        Self {
            resources,
            fetcher,
            loaded: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }
}

impl<F: Fetch> ResourceLoader for ScriptLoader<F> {
    async fn ensure_loaded(&self) -> Result<(), LoadError> {
        self.loaded
            .get_or_try_init(|| async {
                for url in &self.resources {
                    self.fetcher.fetch(url).await?;
                }
                info!(count = self.resources.len(), "widget resources loaded");
                Ok::<(), LoadError>(())
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct RecordingFetcher {
        fetched: Arc<Mutex<Vec<String>>>,
        failing: Arc<Mutex<Option<String>>>,
    }

    impl Fetch for RecordingFetcher {
        async fn fetch(&self, url: &str) -> Result<(), LoadError> {
            tokio::task::yield_now().await;
            self.fetched.lock().push(url.to_string());
            if self.failing.lock().as_deref() == Some(url) {
                return Err(LoadError::Fetch {
                    url: url.to_string(),
                    reason: "offline".to_string(),
                });
            }
            Ok(())
        }
    }

    fn resources() -> Vec<String> {
        vec!["app.js".to_string(), "database.js".to_string()]
    }

    #[tokio::test]
    async fn preloaded_resolves_immediately() {
        assert!(Preloaded.ensure_loaded().await.is_ok());
    }

    #[tokio::test]
    async fn fetches_in_order_once() {
        let fetcher = RecordingFetcher::default();
        let loader = ScriptLoader::new(resources(), fetcher.clone());

        loader.ensure_loaded().await.unwrap();
        loader.ensure_loaded().await.unwrap();

        assert!(loader.is_loaded());
        assert_eq!(*fetcher.fetched.lock(), resources());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_load() {
        let fetcher = RecordingFetcher::default();
        let loader = ScriptLoader::new(resources(), fetcher.clone());

        let (a, b) = tokio::join!(loader.ensure_loaded(), loader.ensure_loaded());

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(*fetcher.fetched.lock(), resources());
    }

    #[tokio::test]
    async fn failed_base_module_stops_the_sequence() {
        let fetcher = RecordingFetcher::default();
        *fetcher.failing.lock() = Some("app.js".to_string());
        let loader = ScriptLoader::new(resources(), fetcher.clone());

        let err = loader.ensure_loaded().await.unwrap_err();

        assert!(err.to_string().contains("app.js"));
        assert_eq!(*fetcher.fetched.lock(), vec!["app.js".to_string()]);
        assert!(!loader.is_loaded());
    }

    #[tokio::test]
    async fn failed_database_module_fails_the_load() {
        let fetcher = RecordingFetcher::default();
        *fetcher.failing.lock() = Some("database.js".to_string());
        let loader = ScriptLoader::new(resources(), fetcher.clone());

        assert!(loader.ensure_loaded().await.is_err());
        assert!(!loader.is_loaded());
    }
}
