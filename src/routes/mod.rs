use axum::http::{header, HeaderValue};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::auth::{sign_in, sign_out};
use crate::handlers::events::{
    create_event, delete_event, discover_events, get_event, list_events, update_event,
};
use crate::handlers::users::{create_user, delete_user, get_user, list_users, update_user};
use crate::handlers::{health_check, page_fallback};
use crate::middleware::page_guard;
use crate::state::AppState;

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/discover", get(discover_events))
        .route(
            "/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/auth/signin", post(sign_in))
        .route("/auth/signout", post(sign_out))
        // API data is per-request; never let browsers cache it
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

pub fn create_routes(state: AppState) -> Router {
    let production = state.config.production;
    let origins = state.config.cors_allowed_origins.clone();

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .fallback(page_fallback)
        .layer(from_fn_with_state(state.clone(), page_guard))
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(production))
        .layer(create_cors_layer(&origins))
        .with_state(state)
}
