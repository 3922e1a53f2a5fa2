use crate::{
    AppState, handlers::posts,
    middleware::{require_user, validate_pid},
};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

use super::guard;

/// Posts Router
///
/// Mounted at `/api/v2/posts`. Every route requires an authenticated user; the
/// destructive routes additionally require the post to exist before the handler runs.
pub fn post_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // PUT /{pid}
        // Edits the post. `content` is required.
        .route("/{pid}", put(posts::edit_post))
        // DELETE /{pid}
        // Purges the post permanently.
        .route(
            "/{pid}",
            delete(posts::purge_post).route_layer(guard(state, validate_pid)),
        )
        // PUT/DELETE /{pid}/state
        // Restores or soft-deletes the post.
        .route(
            "/{pid}/state",
            put(posts::restore_post)
                .delete(posts::delete_post)
                .route_layer(guard(state, validate_pid)),
        )
        // POST/DELETE /{pid}/vote
        // The sign of `delta` picks upvote, downvote or unvote. DELETE always unvotes.
        .route(
            "/{pid}/vote",
            post(posts::vote_post).delete(posts::unvote_post),
        )
        // POST /{pid}/bookmark
        .route("/{pid}/bookmark", post(posts::bookmark_post))
        // DELETE /{pid}/bookmark
        .route(
            "/{pid}/bookmark",
            delete(posts::unbookmark_post).route_layer(guard(state, validate_pid)),
        )
        // POST /{pid}/flag
        // Requires `type` and `reason`.
        .route("/{pid}/flag", post(posts::flag_post))
        // GET /{pid}/replies?recursiveLevels=n
        .route("/{pid}/replies", get(posts::get_post_replies))
        .route_layer(guard(state, require_user))
}
