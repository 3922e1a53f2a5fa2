use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Numeric user id.
pub type Uid = u64;

// --- Request Payloads (Input Schemas) ---

/// EditPostRequest
///
/// Body of `PUT /posts/{pid}`. Documentation only: the handler checks `content`
/// for presence before reading the optional fields.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct EditPostRequest {
    pub content: String,
    /// Guest display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// New topic title, only honoured when editing the main post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_thumb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// VoteRequest
///
/// Body of `POST /posts/{pid}/vote`. Positive upvotes, negative downvotes, zero unvotes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct VoteRequest {
    pub delta: f64,
}

/// FlagRequest
///
/// Body of `POST /posts/{pid}/flag`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct FlagRequest {
    #[serde(rename = "type")]
    pub flag_type: String,
    pub reason: String,
}

/// TopicReplyRequest
///
/// Body of `POST /topics/{tid}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct TopicReplyRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_pid: Option<String>,
}

/// RepliesQuery
///
/// Query string of `GET /posts/{pid}/replies`.
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RepliesQuery {
    /// How many levels of nested replies to include. Defaults to 0.
    pub recursive_levels: Option<u32>,
}

// --- Service Parameter Objects ---

/// EditOptions
///
/// Optional topic-level changes carried alongside a post edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct EditOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_thumb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// EditPayload
///
/// The parameter object handed to `PostService::edit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct EditPayload {
    pub uid: Uid,
    pub pid: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub options: EditOptions,
}

/// ReplyPayload
///
/// The parameter object handed to `TopicService::reply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPayload {
    pub tid: String,
    pub uid: Uid,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_pid: Option<String>,
}

// --- Service Results (Output Schemas) ---

/// VoteResult
///
/// Vote tallies of a post after a vote operation, from the voter's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    pub pid: String,
    pub uid: Uid,
    pub upvotes: u64,
    pub downvotes: u64,
    /// upvotes minus downvotes.
    pub votes: i64,
    pub upvoted: bool,
    pub downvoted: bool,
}

/// PostReply
///
/// A reply to a post. `replies` is only populated when recursion was requested
/// and this level is within the requested depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostReply {
    pub pid: String,
    pub tid: String,
    pub uid: Uid,
    pub content: String,
    pub deleted: bool,
    pub votes: i64,
    /// Display name given by a guest poster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_pid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(no_recursion)]
    pub replies: Option<Vec<PostReply>>,
}

/// Flag
///
/// A moderation report raised against a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub flag_id: u64,
    #[serde(rename = "type")]
    pub flag_type: String,
    pub pid: String,
    pub reporter: Uid,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// ResolvedUid
///
/// Payload of `GET /users/{userslug}/uid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct ResolvedUid {
    pub uid: Uid,
}
