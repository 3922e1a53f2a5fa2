use crate::{
    AppState, handlers::users,
    middleware::{expose_uid, require_admin, require_user},
};
use axum::{
    Router,
    routing::{delete, get, put},
};

use super::guard;

/// Users Router
///
/// Mounted at `/api/v2/users`. The `{userslug}` segment is resolved to a uid by
/// `expose_uid`. Moderation routes sit behind the admin gate, which runs before
/// the slug is resolved.
pub fn user_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // GET /{userslug}/uid
        .route(
            "/{userslug}/uid",
            get(users::get_uid).route_layer(guard(state, expose_uid)),
        )
        // DELETE /{userslug}
        // [Admin] Deletes the account.
        .route(
            "/{userslug}",
            delete(users::delete_user)
                .route_layer(guard(state, expose_uid))
                .route_layer(guard(state, require_admin)),
        )
        // PUT/DELETE /{userslug}/ban
        // [Admin] Bans or unbans the account.
        .route(
            "/{userslug}/ban",
            put(users::ban_user)
                .delete(users::unban_user)
                .route_layer(guard(state, expose_uid))
                .route_layer(guard(state, require_admin)),
        )
        .route_layer(guard(state, require_user))
}
