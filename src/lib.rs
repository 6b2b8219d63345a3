pub mod app;
pub mod config;
pub mod controller;
pub mod errors;
pub mod flags;
pub mod format;
pub mod handlers;
pub mod loader;
pub mod models;
pub mod remote;
pub mod state;
pub mod storage;
pub mod store;
pub mod ui;
pub mod view;

pub use app::router;
pub use config::{ServerConfig, StoreConfig, WidgetConfig};
pub use controller::{Connect, VoteOutcome, WidgetController};
pub use errors::{LoadError, RemoteError, WidgetError};
pub use flags::{FileFlagStore, FlagStore, MemoryFlagStore};
pub use format::format_count;
pub use loader::{HttpFetcher, Preloaded, ResourceLoader, ScriptLoader};
pub use remote::{HttpCounterClient, LocalCounterClient, RemoteCounterClient, Subscription};
pub use state::AppState;
pub use storage::{load_data, load_store};
pub use store::CounterStore;
pub use view::{Container, Page, WidgetState};
