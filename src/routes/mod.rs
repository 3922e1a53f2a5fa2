//! Router Module Index
//!
//! One router per forum resource. Every router is mounted under `/api/v2` and wraps
//! all of its routes in `require_user`. The per-route guards (admin gate, slug
//! resolution, existence checks) are layered on the individual method routers and
//! only run after authentication succeeded.
use axum::middleware::{self, FromFnLayer};

use crate::AppState;

/// Post operations: edit, purge, delete/restore, vote, bookmark, flag, replies.
pub mod posts;

/// Topic operations: reply, purge, delete/restore, follow.
pub mod topics;

/// User operations: slug lookup and administrator-only moderation.
pub mod users;

/// Wraps a middleware function into a route layer bound to the application state.
pub(crate) fn guard<F, T>(state: &AppState, f: F) -> FromFnLayer<F, AppState, T> {
    middleware::from_fn_with_state(state.clone(), f)
}
