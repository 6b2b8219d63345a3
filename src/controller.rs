use crate::config::WidgetConfig;
use crate::errors::{RemoteError, WidgetError};
use crate::flags::FlagStore;
use crate::loader::ResourceLoader;
use crate::remote::{OnUpdate, RemoteCounterClient, Subscription};
use crate::view::{self, Notifier, Page, RenderState, VOTE_FAILED_TEXT, WidgetState};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, error, info, warn};

/// Builds the remote client once the loader has made it available.
pub type Connect<R> = Box<dyn Fn() -> Result<R, RemoteError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Not ready, already voted, or a vote is still in flight.
    Ignored,
    /// The vote was counted; carries the total the store reported.
    Counted(u64),
}

/// One widget instance bound to one page.
///
/// Cloning yields another handle to the same instance.
pub struct WidgetController<L, R> {
    inner: Arc<Inner<L, R>>,
}

impl<L, R> Clone for WidgetController<L, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<L, R> {
    config: WidgetConfig,
    flags: Arc<dyn FlagStore>,
    loader: L,
    connect: Connect<R>,
    page: Page,
    notifier: Arc<dyn Notifier>,
    client: OnceLock<Arc<R>>,
    state: Mutex<ControllerState>,
}

struct ControllerState {
    phase: WidgetState,
    started: bool,
    voted: bool,
    visited: bool,
    vote_in_flight: bool,
    vote_count: u64,
    visitor_count: u64,
    subscriptions: Vec<Subscription>,
}

#[derive(Clone, Copy)]
enum Counter {
    Votes,
    Visitors,
}

impl<L, R> WidgetController<L, R>
where
    L: ResourceLoader + 'static,
    R: RemoteCounterClient + 'static,
{
    pub fn new(
        config: WidgetConfig,
        flags: Arc<dyn FlagStore>,
        loader: L,
        connect: Connect<R>,
        page: Page,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let inner = Inner {
            config,
            flags,
            loader,
            connect,
            page,
            notifier,
            client: OnceLock::new(),
            state: Mutex::new(ControllerState {
                phase: WidgetState::Loading,
                started: false,
                voted: false,
                visited: false,
                vote_in_flight: false,
                vote_count: 0,
                visitor_count: 0,
                subscriptions: Vec::new(),
            }),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Brings the widget from `Loading` to `Ready`, or to `Error` if the store is unreachable.
    ///
    /// Only the first call does anything; later calls fail once the widget is in `Error`.
    pub async fn init(&self) -> Result<(), WidgetError> {
        let config = &self.inner.config;
        {
            let mut state = self.inner.state.lock();
            if state.started {
                return match state.phase {
                    WidgetState::Error => Err(WidgetError::Unavailable),
                    WidgetState::Loading | WidgetState::Ready => Ok(()),
                };
            }
            state.started = true;
            state.voted = self.inner.flags.get(&config.voted_key);
            state.visited = self.inner.flags.get(&config.visited_key);
        }
        self.update_ui();

        if let Err(err) = self.inner.loader.ensure_loaded().await {
            error!("failed to load widget resources: {err}");
            self.fail();
            return Err(err.into());
        }

        let client = match (self.inner.connect)() {
            Ok(client) => Arc::new(client),
            Err(err) => {
                error!("failed to connect to counter store: {err}");
                self.fail();
                return Err(err.into());
            }
        };
        let client = Arc::clone(self.inner.client.get_or_init(|| client));

        if config.track_visitors && !self.visited() {
            self.track_visitor(client.as_ref()).await;
        }

        if let Err(err) = self.subscribe(client.as_ref()) {
            error!("failed to subscribe to counters: {err}");
            self.fail();
            return Err(err.into());
        }

        self.inner.state.lock().phase = WidgetState::Ready;
        info!(voted = self.voted(), "widget ready");
        self.update_ui();
        Ok(())
    }

    async fn track_visitor(&self, client: &R) {
        let config = &self.inner.config;
        match client.increment(&config.visitor_path).await {
            Ok(total) => {
                self.inner.flags.set(&config.visited_key, true);
                self.inner.state.lock().visited = true;
                info!(total, "visitor counted");
            }
            Err(err) => warn!("failed to count visitor: {err}"),
        }
    }

    fn subscribe(&self, client: &R) -> Result<(), RemoteError> {
        let config = &self.inner.config;
        let mut subscriptions = vec![client.subscribe(&config.vote_path, self.on_update(Counter::Votes))?];
        if config.track_visitors {
            subscriptions.push(
                client.subscribe(&config.visitor_path, self.on_update(Counter::Visitors))?,
            );
        }
        self.inner.state.lock().subscriptions.extend(subscriptions);
        Ok(())
    }

    fn on_update(&self, counter: Counter) -> OnUpdate {
        let weak: Weak<Inner<L, R>> = Arc::downgrade(&self.inner);
        Box::new(move |value| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            {
                let mut state = inner.state.lock();
                match counter {
                    Counter::Votes => state.vote_count = value,
                    Counter::Visitors => state.visitor_count = value,
                }
            }
            WidgetController { inner }.update_ui();
        })
    }

    /// Casts this profile's vote.
    ///
    /// Does nothing unless the widget is `Ready`, has not voted yet, and no other
    /// vote is in flight. A failed vote notifies the user and can be retried.
    pub async fn cast_vote(&self) -> Result<VoteOutcome, WidgetError> {
        let client = {
            let mut state = self.inner.state.lock();
            if state.voted || state.vote_in_flight || state.phase != WidgetState::Ready {
                debug!("vote ignored");
                return Ok(VoteOutcome::Ignored);
            }
            let Some(client) = self.inner.client.get() else {
                return Ok(VoteOutcome::Ignored);
            };
            state.vote_in_flight = true;
            Arc::clone(client)
        };

        let config = &self.inner.config;
        let result = client.increment(&config.vote_path).await;

        let outcome = {
            let mut state = self.inner.state.lock();
            state.vote_in_flight = false;
            match result {
                Ok(total) => {
                    state.voted = true;
                    Ok(total)
                }
                Err(err) => Err(err),
            }
        };

        match outcome {
            Ok(total) => {
                self.inner.flags.set(&config.voted_key, true);
                info!(total, "vote counted");
                self.update_ui();
                Ok(VoteOutcome::Counted(total))
            }
            Err(err) => {
                warn!("failed to submit vote: {err}");
                self.inner.notifier.notify(VOTE_FAILED_TEXT);
                Err(err.into())
            }
        }
    }

    /// Stops all live updates. The widget keeps its last state.
    pub fn dispose(&self) {
        let subscriptions = std::mem::take(&mut self.inner.state.lock().subscriptions);
        for subscription in &subscriptions {
            subscription.cancel();
        }
        debug!(count = subscriptions.len(), "widget disposed");
    }

    /// Draws the current state onto the page.
    pub fn update_ui(&self) {
        let snapshot = self.render_state();
        self.inner.page.update(|container| view::render(&snapshot, container));
    }

    fn fail(&self) {
        self.inner.state.lock().phase = WidgetState::Error;
        self.inner.page.update(view::show_unavailable);
    }

    pub fn render_state(&self) -> RenderState {
        let state = self.inner.state.lock();
        RenderState {
            state: state.phase,
            voted: state.voted,
            vote_count: state.vote_count,
            visitor_count: state.visitor_count,
        }
    }

    pub fn state(&self) -> WidgetState {
        self.inner.state.lock().phase
    }

    pub fn voted(&self) -> bool {
        self.inner.state.lock().voted
    }

    pub fn visited(&self) -> bool {
        self.inner.state.lock().visited
    }

    pub fn vote_count(&self) -> u64 {
        self.inner.state.lock().vote_count
    }

    pub fn visitor_count(&self) -> u64 {
        self.inner.state.lock().visitor_count
    }

    pub fn page(&self) -> &Page {
        &self.inner.page
    }
}
