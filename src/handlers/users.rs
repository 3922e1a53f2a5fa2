use axum::{Json, extract::State};

use crate::{
    context::{AuthUser, ResolvedUser},
    error::{ApiError, ApiErrorBody, ApiResponse, Empty},
    models::ResolvedUid,
    services::UserState,
};

type EmptyResponse = Result<Json<ApiResponse<Empty>>, ApiError>;

/// get_uid
///
/// Resolves a userslug to the user's numeric id.
#[utoipa::path(
    get,
    path = "/api/v2/users/{userslug}/uid",
    params(("userslug" = String, Path, description = "User slug")),
    responses(
        (status = 200, description = "Resolved", body = ResolvedUid),
        (status = 404, description = "Unknown slug", body = ApiErrorBody)
    )
)]
pub async fn get_uid(ResolvedUser { uid }: ResolvedUser) -> Json<ApiResponse<ResolvedUid>> {
    Json(ApiResponse::ok(ResolvedUid { uid }))
}

/// delete_user
///
/// [Admin Route] Deletes the account named by the slug.
#[utoipa::path(
    delete,
    path = "/api/v2/users/{userslug}",
    params(("userslug" = String, Path, description = "User slug")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Not an administrator", body = ApiErrorBody),
        (status = 404, description = "Unknown slug", body = ApiErrorBody)
    )
)]
pub async fn delete_user(
    AuthUser { uid: caller }: AuthUser,
    ResolvedUser { uid }: ResolvedUser,
    State(users): State<UserState>,
) -> EmptyResponse {
    ApiResponse::from_unit(users.delete(caller, uid).await)
}

/// ban_user
///
/// [Admin Route]
#[utoipa::path(
    put,
    path = "/api/v2/users/{userslug}/ban",
    params(("userslug" = String, Path, description = "User slug")),
    responses((status = 200, description = "Banned"))
)]
pub async fn ban_user(
    ResolvedUser { uid }: ResolvedUser,
    State(users): State<UserState>,
) -> EmptyResponse {
    ApiResponse::from_unit(users.ban(uid).await)
}

/// unban_user
///
/// [Admin Route]
#[utoipa::path(
    delete,
    path = "/api/v2/users/{userslug}/ban",
    params(("userslug" = String, Path, description = "User slug")),
    responses((status = 200, description = "Unbanned"))
)]
pub async fn unban_user(
    ResolvedUser { uid }: ResolvedUser,
    State(users): State<UserState>,
) -> EmptyResponse {
    ApiResponse::from_unit(users.unban(uid).await)
}
