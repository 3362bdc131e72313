mod error;
mod recordings;
mod todos;
mod users;

pub use error::ApiError;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::TokenSigner;
use minutes_core::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub signer: TokenSigner,
}

pub fn create_router(db: Database, signer: TokenSigner) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/login", post(users::login))
        .route("/api/users", get(users::list_users))
        .route("/api/recordings", get(recordings::list_recordings))
        .route(
            "/api/recordings/{id}",
            get(recordings::get_recording).delete(recordings::delete_recording),
        )
        .route("/api/todos", get(todos::list_todos).post(todos::create_todo))
        .route(
            "/api/todos/{id}",
            get(todos::get_todo)
                .put(todos::update_todo)
                .delete(todos::delete_todo),
        )
        .route("/api/todos/{id}/history", get(todos::list_todo_history))
        // The browser SPA is served from another origin during development.
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(AppState { db, signer })
}

async fn health() -> &'static str {
    "ok"
}
