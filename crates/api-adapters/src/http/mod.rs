//! Axum transport for the forum (feature `web-axum`).

mod error;
mod handlers;

use std::sync::Arc;

use axum::http::{header::CONTENT_TYPE, Method};
use axum::routing::{delete, get, patch};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

use crate::AppState;

/// Builds the full route table over a shared [`AppState`].
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/users", get(handlers::list_users).post(handlers::register_user))
        .route("/users/{user_id}", get(handlers::get_user))
        .route(
            "/communities",
            get(handlers::list_communities).post(handlers::create_community),
        )
        .route("/communities/{community_id}", get(handlers::get_community))
        .route("/communities/{community_id}/posts", get(handlers::community_posts))
        .route("/posts", get(handlers::list_posts).post(handlers::create_post))
        .route("/posts/{post_id}", get(handlers::get_post))
        .route("/posts/{post_id}/views", patch(handlers::record_view))
        .route("/posts/{post_id}/comments", get(handlers::post_comments))
        .route("/posts/{post_id}/upvote", patch(handlers::upvote_post))
        .route("/posts/{post_id}/downvote", patch(handlers::downvote_post))
        .route(
            "/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route("/comments/{comment_id}", delete(handlers::delete_comment))
        .route("/comments/{comment_id}/upvote", patch(handlers::upvote_comment))
        .route("/comments/{comment_id}/downvote", patch(handlers::downvote_comment))
        .route("/linkflairs", get(handlers::list_flairs).post(handlers::create_flair))
        .route("/search", get(handlers::search))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
