use axum::{
    Json,
    extract::{Path, State},
};

use super::{JsonObject, check_required, optional_text, required_text};
use crate::{
    context::AuthUser,
    error::{ApiError, ApiErrorBody, ApiResponse, Empty},
    models::{PostReply, ReplyPayload, TopicReplyRequest},
    services::TopicState,
};

type EmptyResponse = Result<Json<ApiResponse<Empty>>, ApiError>;

/// reply_to_topic
///
/// Posts a reply in a topic, optionally in response to `toPid`.
#[utoipa::path(
    post,
    path = "/api/v2/topics/{tid}",
    params(("tid" = String, Path, description = "Topic ID")),
    request_body = TopicReplyRequest,
    responses(
        (status = 200, description = "Reply created", body = PostReply),
        (status = 400, description = "Missing content", body = ApiErrorBody),
        (status = 404, description = "No such topic", body = ApiErrorBody)
    )
)]
pub async fn reply_to_topic(
    AuthUser { uid }: AuthUser,
    State(topics): State<TopicState>,
    Path(tid): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<Json<ApiResponse<PostReply>>, ApiError> {
    check_required(&["content"], &body)?;

    let payload = ReplyPayload {
        tid,
        uid,
        content: required_text(&body, "content")?,
        to_pid: optional_text(&body, "toPid")?,
    };

    ApiResponse::from_result(topics.reply(payload).await)
}

/// purge_topic
#[utoipa::path(
    delete,
    path = "/api/v2/topics/{tid}",
    params(("tid" = String, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Purged"),
        (status = 404, description = "No such topic", body = ApiErrorBody)
    )
)]
pub async fn purge_topic(
    AuthUser { uid }: AuthUser,
    State(topics): State<TopicState>,
    Path(tid): Path<String>,
) -> EmptyResponse {
    ApiResponse::from_unit(topics.purge(&tid, uid).await)
}

/// restore_topic
#[utoipa::path(
    put,
    path = "/api/v2/topics/{tid}/state",
    params(("tid" = String, Path, description = "Topic ID")),
    responses((status = 200, description = "Restored"))
)]
pub async fn restore_topic(
    AuthUser { uid }: AuthUser,
    State(topics): State<TopicState>,
    Path(tid): Path<String>,
) -> EmptyResponse {
    ApiResponse::from_unit(topics.restore(&tid, uid).await)
}

/// delete_topic
#[utoipa::path(
    delete,
    path = "/api/v2/topics/{tid}/state",
    params(("tid" = String, Path, description = "Topic ID")),
    responses((status = 200, description = "Deleted"))
)]
pub async fn delete_topic(
    AuthUser { uid }: AuthUser,
    State(topics): State<TopicState>,
    Path(tid): Path<String>,
) -> EmptyResponse {
    ApiResponse::from_unit(topics.delete(&tid, uid).await)
}

/// follow_topic
#[utoipa::path(
    put,
    path = "/api/v2/topics/{tid}/follow",
    params(("tid" = String, Path, description = "Topic ID")),
    responses((status = 200, description = "Following"))
)]
pub async fn follow_topic(
    AuthUser { uid }: AuthUser,
    State(topics): State<TopicState>,
    Path(tid): Path<String>,
) -> EmptyResponse {
    ApiResponse::from_unit(topics.follow(&tid, uid).await)
}

/// unfollow_topic
#[utoipa::path(
    delete,
    path = "/api/v2/topics/{tid}/follow",
    params(("tid" = String, Path, description = "Topic ID")),
    responses((status = 200, description = "No longer following"))
)]
pub async fn unfollow_topic(
    AuthUser { uid }: AuthUser,
    State(topics): State<TopicState>,
    Path(tid): Path<String>,
) -> EmptyResponse {
    ApiResponse::from_unit(topics.unfollow(&tid, uid).await)
}
