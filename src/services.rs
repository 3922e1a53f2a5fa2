use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    error::ServiceResult,
    models::{EditPayload, PostReply, ReplyPayload, Uid, VoteResult},
};

// --- Service Traits ---

// The forum's business logic lives behind these traits. The HTTP layer only
// validates, delegates and maps outcomes; it never inspects forum state itself.
// Send + Sync + async_trait make the trait objects shareable across Axum's
// asynchronous task boundaries.

/// UserService
///
/// User lookups and administrative user operations.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn is_administrator(&self, uid: Uid) -> ServiceResult<bool>;
    /// `Ok(None)` means no user carries this slug.
    async fn get_uid_by_userslug(&self, userslug: &str) -> ServiceResult<Option<Uid>>;
    /// Deletes `uid` on behalf of `caller`.
    async fn delete(&self, caller: Uid, uid: Uid) -> ServiceResult<()>;
    async fn ban(&self, uid: Uid) -> ServiceResult<()>;
    async fn unban(&self, uid: Uid) -> ServiceResult<()>;
}

/// PostService
///
/// Post-level operations. `pid` is forwarded exactly as it appeared in the path.
#[async_trait]
pub trait PostService: Send + Sync {
    async fn exists(&self, pid: &str) -> ServiceResult<bool>;
    async fn edit(&self, payload: EditPayload) -> ServiceResult<()>;
    /// Permanently removes the post.
    async fn purge(&self, pid: &str, uid: Uid) -> ServiceResult<()>;
    /// Soft-deletes the post.
    async fn delete(&self, pid: &str, uid: Uid) -> ServiceResult<()>;
    async fn restore(&self, pid: &str, uid: Uid) -> ServiceResult<()>;
    async fn upvote(&self, pid: &str, uid: Uid) -> ServiceResult<VoteResult>;
    async fn downvote(&self, pid: &str, uid: Uid) -> ServiceResult<VoteResult>;
    async fn unvote(&self, pid: &str, uid: Uid) -> ServiceResult<VoteResult>;
    async fn bookmark(&self, pid: &str, uid: Uid) -> ServiceResult<()>;
    async fn unbookmark(&self, pid: &str, uid: Uid) -> ServiceResult<()>;
}

/// TopicService
///
/// Topic-level operations and reply threading.
#[async_trait]
pub trait TopicService: Send + Sync {
    async fn exists(&self, tid: &str) -> ServiceResult<bool>;
    /// One reply list per requested pid, in request order. `recursive_levels` nested
    /// levels of replies-to-replies are attached below the first level.
    async fn get_post_replies(
        &self,
        pids: &[String],
        uid: Uid,
        recursive_levels: u32,
    ) -> ServiceResult<Vec<Vec<PostReply>>>;
    async fn reply(&self, payload: ReplyPayload) -> ServiceResult<PostReply>;
    async fn purge(&self, tid: &str, uid: Uid) -> ServiceResult<()>;
    async fn delete(&self, tid: &str, uid: Uid) -> ServiceResult<()>;
    async fn restore(&self, tid: &str, uid: Uid) -> ServiceResult<()>;
    async fn follow(&self, tid: &str, uid: Uid) -> ServiceResult<()>;
    async fn unfollow(&self, tid: &str, uid: Uid) -> ServiceResult<()>;
}

/// FlagService
///
/// Moderation reports.
#[async_trait]
pub trait FlagService: Send + Sync {
    async fn create(&self, flag_type: &str, pid: &str, uid: Uid, reason: &str) -> ServiceResult<()>;
}

pub type UserState = Arc<dyn UserService>;
pub type PostState = Arc<dyn PostService>;
pub type TopicState = Arc<dyn TopicService>;
pub type FlagState = Arc<dyn FlagService>;
