// axum adapter: routing, session auth, CORS, security headers and the
// web-context encoding of core entities

pub mod dto;
pub mod error;
pub mod layers;
pub mod routes;
pub mod scrapers;

use app_core::{Core, DatabasePort};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::instrument;

#[derive(Clone)]
pub struct AppState {
    pub core: Arc<Core>,
}

// --- /health (service liveness) ---
#[instrument(name = "health")]
async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// --- /health/db (database readiness) ---
#[derive(Serialize)]
struct DbStatus {
    db: &'static str,
}

#[instrument(name = "health_db", skip(app_state))]
async fn health_db(State(app_state): State<AppState>) -> impl IntoResponse {
    match app_state.core.database.ping_db().await {
        Ok(_) => (StatusCode::OK, axum::Json(DbStatus { db: "ok" })),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(DbStatus { db: "down" }),
        ),
    }
}

/// The full application router. Every response carries the security
/// headers; CORS headers are attached for origins matching the configured
/// pattern so that error responses stay readable by the client too.
pub fn build_router(core: Arc<Core>) -> Router {
    let cors = layers::cors_layer(&core.config);
    let app_state = AppState { core };

    Router::new()
        .route("/health", get(health))
        .route("/health/db", get(health_db))
        .route("/regions", get(routes::regions::list))
        .route(
            "/users/session",
            put(routes::sessions::login)
                .delete(routes::sessions::logout)
                .get(routes::sessions::whoami),
        )
        .route("/{region}/players", get(routes::players::list))
        .route(
            "/{region}/players/{id}",
            get(routes::players::get).put(routes::players::update),
        )
        .route(
            "/{region}/tournaments",
            get(routes::tournaments::list).post(routes::tournaments::create),
        )
        .route(
            "/{region}/tournaments/{id}",
            get(routes::tournaments::get)
                .put(routes::tournaments::update)
                .delete(routes::tournaments::delete),
        )
        .route(
            "/{region}/tournaments/{id}/finalize",
            post(routes::tournaments::finalize),
        )
        .route(
            "/{region}/pending_tournaments/{id}",
            put(routes::tournaments::update_alias_mappings),
        )
        .route(
            "/{region}/rankings",
            get(routes::rankings::latest)
                .post(routes::rankings::generate)
                .put(routes::rankings::generate_with_overrides),
        )
        .route("/{region}/matches/{id}", get(routes::matches::history))
        .route(
            "/{region}/merges",
            get(routes::merges::list).put(routes::merges::create),
        )
        .route("/{region}/merges/{id}", delete(routes::merges::undo))
        .layer(axum::middleware::from_fn(layers::security_headers))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
