use crate::{
    AppState, handlers::topics,
    middleware::{require_user, validate_tid},
};
use axum::{
    Router,
    routing::{post, put},
};

use super::guard;

/// Topics Router
///
/// Mounted at `/api/v2/topics`. Every route requires an authenticated user and an
/// existing topic.
pub fn topic_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // POST/DELETE /{tid}
        // Replies in the topic, or purges it.
        .route(
            "/{tid}",
            post(topics::reply_to_topic).delete(topics::purge_topic),
        )
        // PUT/DELETE /{tid}/state
        .route(
            "/{tid}/state",
            put(topics::restore_topic).delete(topics::delete_topic),
        )
        // PUT/DELETE /{tid}/follow
        .route(
            "/{tid}/follow",
            put(topics::follow_topic).delete(topics::unfollow_topic),
        )
        .route_layer(guard(state, validate_tid))
        .route_layer(guard(state, require_user))
}
