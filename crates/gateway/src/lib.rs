//! Papertok development backend
//!
//! Serves the HTTP surface the remote data source consumes, backed by any
//! [`DataSource`] (normally the seeded mock store). Requests act as the
//! current user (id 0).

pub mod handlers;
pub mod middleware;

use axum::{
    routing::{delete, get, post},
    Router,
};
use handlers::{knowledge_bases, messages, papers, posts, users};
use papertok_common::{config::AppConfig, DataSource};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub source: Arc<dyn DataSource>,
}

impl AppState {
    pub fn new(config: AppConfig, source: Arc<dyn DataSource>) -> Self {
        Self {
            config: Arc::new(config),
            source,
        }
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    Router::new()
        .route("/health", get(handlers::health::health))
        // Users
        .route("/users/me", get(users::current_user))
        .route("/users/following", get(users::following_list))
        .route("/users/username/{username}", get(users::user_by_username))
        .route("/users/is-following/{id}", get(users::is_following))
        .route("/users/follow/{id}", post(users::follow))
        .route("/users/unfollow/{id}", post(users::unfollow))
        .route("/users/{id}", get(users::get_user))
        // Knowledge bases
        .route(
            "/knowledge-bases",
            get(knowledge_bases::list_all).post(knowledge_bases::create),
        )
        .route("/knowledge-bases/{id}", get(knowledge_bases::get_knowledge_base))
        .route("/knowledge-bases/{id}/papers", post(knowledge_bases::add_paper))
        .route("/knowledge-bases/user/{id}", get(knowledge_bases::by_user))
        .route("/knowledge-bases/username/{username}", get(knowledge_bases::by_username))
        // Papers
        .route("/papers/search", get(papers::search))
        .route("/papers/{id}", get(papers::get_paper))
        // Messages
        .route("/messages", post(messages::send))
        .route("/messages/conversations", get(messages::conversations))
        .route("/messages/{id}", get(messages::thread))
        .route("/messages/{id}/read", post(messages::mark_read))
        // Moderation
        .route("/posts", get(posts::list_all))
        .route("/posts/pending", get(posts::list_pending))
        .route("/posts/hidden", get(posts::list_hidden))
        .route("/posts/{id}", delete(posts::delete_post))
        .route("/posts/{id}/comments", get(posts::comments))
        .route("/posts/{id}/approve", post(posts::approve_post))
        .route("/posts/{id}/hide", post(posts::hide_post))
        .route("/posts/comments/{id}", delete(posts::delete_comment))
        .route("/posts/comments/{id}/approve", post(posts::approve_comment))
        .route("/posts/comments/{id}/hide", post(posts::hide_comment))
        .layer(axum::middleware::from_fn(middleware::metrics::track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}
