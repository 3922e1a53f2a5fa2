use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use serde_json::{Map, Value};

use super::{JsonObject, check_required, optional_text, required_text};
use crate::{
    context::AuthUser,
    error::{ApiError, ApiErrorBody, ApiResponse, Empty},
    models::{
        EditOptions, EditPayload, EditPostRequest, FlagRequest, PostReply, RepliesQuery,
        VoteRequest, VoteResult,
    },
    services::{FlagState, PostState, TopicState},
};

type EmptyResponse = Result<Json<ApiResponse<Empty>>, ApiError>;

/// VoteDirection
///
/// Which vote operation a `delta` selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
    Clear,
}

impl VoteDirection {
    /// Positive upvotes, negative downvotes. Zero and NaN clear the vote.
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            VoteDirection::Up
        } else if delta < 0.0 {
            VoteDirection::Down
        } else {
            VoteDirection::Clear
        }
    }
}

/// Reads `delta` the way a loosely typed client sends it: numbers, numeric strings
/// and booleans count, anything else is NaN.
fn delta_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        _ => f64::NAN,
    }
}

/// Tags are forwarded exactly as sent. Absent, `null`, `false` and `""` mean "no tags
/// given"; anything other than an array of strings is a bad request.
fn tags_field(body: &Map<String, Value>) -> Result<Option<Vec<String>>, ApiError> {
    let invalid = || ApiError::bad_request().with_params(["tags"]);
    match body.get("tags") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(invalid()),
    }
}

/// edit_post
///
/// Edits a post's content. `handle`, `title` and `topic_thumb` are only forwarded
/// when present and non-empty; `tags` is forwarded as sent.
#[utoipa::path(
    put,
    path = "/api/v2/posts/{pid}",
    params(("pid" = String, Path, description = "Post ID")),
    request_body = EditPostRequest,
    responses(
        (status = 200, description = "Edited"),
        (status = 400, description = "Missing content", body = ApiErrorBody),
        (status = 401, description = "Not authenticated", body = ApiErrorBody)
    )
)]
pub async fn edit_post(
    AuthUser { uid }: AuthUser,
    State(posts): State<PostState>,
    Path(pid): Path<String>,
    JsonObject(body): JsonObject,
) -> EmptyResponse {
    check_required(&["content"], &body)?;

    let payload = EditPayload {
        uid,
        pid,
        content: required_text(&body, "content")?,
        handle: optional_text(&body, "handle")?,
        title: optional_text(&body, "title")?,
        options: EditOptions {
            topic_thumb: optional_text(&body, "topic_thumb")?,
            tags: tags_field(&body)?,
        },
    };

    ApiResponse::from_unit(posts.edit(payload).await)
}

/// purge_post
///
/// Permanently removes a post.
#[utoipa::path(
    delete,
    path = "/api/v2/posts/{pid}",
    params(("pid" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Purged"),
        (status = 404, description = "No such post", body = ApiErrorBody)
    )
)]
pub async fn purge_post(
    AuthUser { uid }: AuthUser,
    State(posts): State<PostState>,
    Path(pid): Path<String>,
) -> EmptyResponse {
    ApiResponse::from_unit(posts.purge(&pid, uid).await)
}

/// restore_post
#[utoipa::path(
    put,
    path = "/api/v2/posts/{pid}/state",
    params(("pid" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Restored"),
        (status = 404, description = "No such post", body = ApiErrorBody)
    )
)]
pub async fn restore_post(
    AuthUser { uid }: AuthUser,
    State(posts): State<PostState>,
    Path(pid): Path<String>,
) -> EmptyResponse {
    ApiResponse::from_unit(posts.restore(&pid, uid).await)
}

/// delete_post
///
/// Soft-deletes a post; `restore_post` undoes it.
#[utoipa::path(
    delete,
    path = "/api/v2/posts/{pid}/state",
    params(("pid" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "No such post", body = ApiErrorBody)
    )
)]
pub async fn delete_post(
    AuthUser { uid }: AuthUser,
    State(posts): State<PostState>,
    Path(pid): Path<String>,
) -> EmptyResponse {
    ApiResponse::from_unit(posts.delete(&pid, uid).await)
}

/// vote_post
///
/// Casts, flips or clears the caller's vote depending on the sign of `delta`.
#[utoipa::path(
    post,
    path = "/api/v2/posts/{pid}/vote",
    params(("pid" = String, Path, description = "Post ID")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote recorded", body = VoteResult),
        (status = 400, description = "Missing delta", body = ApiErrorBody)
    )
)]
pub async fn vote_post(
    AuthUser { uid }: AuthUser,
    State(posts): State<PostState>,
    Path(pid): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<Json<ApiResponse<VoteResult>>, ApiError> {
    check_required(&["delta"], &body)?;

    let delta = body.get("delta").map(delta_value).unwrap_or(f64::NAN);
    let result = match VoteDirection::from_delta(delta) {
        VoteDirection::Up => posts.upvote(&pid, uid).await,
        VoteDirection::Down => posts.downvote(&pid, uid).await,
        VoteDirection::Clear => posts.unvote(&pid, uid).await,
    };

    ApiResponse::from_result(result)
}

/// unvote_post
///
/// Clears the caller's vote regardless of any body.
#[utoipa::path(
    delete,
    path = "/api/v2/posts/{pid}/vote",
    params(("pid" = String, Path, description = "Post ID")),
    responses((status = 200, description = "Vote cleared", body = VoteResult))
)]
pub async fn unvote_post(
    AuthUser { uid }: AuthUser,
    State(posts): State<PostState>,
    Path(pid): Path<String>,
) -> Result<Json<ApiResponse<VoteResult>>, ApiError> {
    ApiResponse::from_result(posts.unvote(&pid, uid).await)
}

/// bookmark_post
#[utoipa::path(
    post,
    path = "/api/v2/posts/{pid}/bookmark",
    params(("pid" = String, Path, description = "Post ID")),
    responses((status = 200, description = "Bookmarked"))
)]
pub async fn bookmark_post(
    AuthUser { uid }: AuthUser,
    State(posts): State<PostState>,
    Path(pid): Path<String>,
) -> EmptyResponse {
    ApiResponse::from_unit(posts.bookmark(&pid, uid).await)
}

/// unbookmark_post
#[utoipa::path(
    delete,
    path = "/api/v2/posts/{pid}/bookmark",
    params(("pid" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Bookmark removed"),
        (status = 404, description = "No such post", body = ApiErrorBody)
    )
)]
pub async fn unbookmark_post(
    AuthUser { uid }: AuthUser,
    State(posts): State<PostState>,
    Path(pid): Path<String>,
) -> EmptyResponse {
    ApiResponse::from_unit(posts.unbookmark(&pid, uid).await)
}

/// flag_post
///
/// Reports a post to the moderators. Both `type` and `reason` are required.
#[utoipa::path(
    post,
    path = "/api/v2/posts/{pid}/flag",
    params(("pid" = String, Path, description = "Post ID")),
    request_body = FlagRequest,
    responses(
        (status = 200, description = "Flagged"),
        (status = 400, description = "Missing type or reason", body = ApiErrorBody)
    )
)]
pub async fn flag_post(
    AuthUser { uid }: AuthUser,
    State(flags): State<FlagState>,
    Path(pid): Path<String>,
    JsonObject(body): JsonObject,
) -> EmptyResponse {
    check_required(&["type", "reason"], &body)?;

    let flag_type = required_text(&body, "type")?;
    let reason = required_text(&body, "reason")?;

    ApiResponse::from_unit(flags.create(&flag_type, &pid, uid, &reason).await)
}

/// get_post_replies
///
/// Lists the replies to a post, `recursiveLevels` levels deep (default 0).
/// The payload holds one reply list per requested post.
#[utoipa::path(
    get,
    path = "/api/v2/posts/{pid}/replies",
    params(("pid" = String, Path, description = "Post ID"), RepliesQuery),
    responses(
        (status = 200, description = "Replies", body = Vec<Vec<PostReply>>),
        (status = 400, description = "Malformed recursiveLevels", body = ApiErrorBody)
    )
)]
pub async fn get_post_replies(
    AuthUser { uid }: AuthUser,
    State(topics): State<TopicState>,
    Path(pid): Path<String>,
    query: Result<Query<RepliesQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Vec<PostReply>>>>, ApiError> {
    let Query(query) = query.map_err(|e| {
        tracing::debug!(error = %e, "malformed replies query");
        ApiError::bad_request().with_params(["recursiveLevels"])
    })?;
    let recursive_levels = query.recursive_levels.unwrap_or(0);

    ApiResponse::from_result(
        topics
            .get_post_replies(&[pid], uid, recursive_levels)
            .await,
    )
}
