use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/static/counter-app.js", get(handlers::app_script))
        .route("/static/counter-database.js", get(handlers::database_script))
        .route("/api/counters/:group/:name", get(handlers::get_counter))
        .route("/api/counters/:group/:name/increment", post(handlers::increment_counter))
        .with_state(state)
}
