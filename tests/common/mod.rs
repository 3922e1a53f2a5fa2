#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use forum_write_api::{
    AppState,
    auth::{AuthProvider, Principal},
    create_router,
    error::{ServiceError, ServiceResult},
    models::{EditPayload, PostReply, ReplyPayload, Uid, VoteResult},
    services::{FlagService, PostService, TopicService, UserService},
};
use serde_json::Value;
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};
use tower::util::ServiceExt;

// --- MOCK FORUM ---

// Records every service call as a short string ("upvote:42:7") so tests can assert
// exactly what reached the collaborators, and in which order.
#[derive(Default)]
pub struct MockForum {
    pub calls: Mutex<Vec<String>>,
    pub edits: Mutex<Vec<EditPayload>>,
    pub replies: Mutex<Vec<ReplyPayload>>,

    pub admins: HashSet<Uid>,
    pub slugs: HashMap<String, Uid>,
    pub posts: HashSet<String>,
    pub topics: HashSet<String>,

    // Lookup failures surfaced by the guards.
    pub fail_admin_lookup: bool,
    pub fail_slug_lookup: bool,
    pub fail_exists: bool,

    // Returned by every mutating operation instead of success, when set.
    pub outcome: Option<ServiceError>,
}

impl MockForum {
    /// Post 42 and topic 10 exist, uid 1 is an administrator, `alice` is uid 5.
    pub fn seeded() -> Self {
        Self {
            admins: HashSet::from([1]),
            slugs: HashMap::from([("alice".to_string(), 5), ("admin".to_string(), 1)]),
            posts: HashSet::from(["42".to_string()]),
            topics: HashSet::from(["10".to_string()]),
            ..Default::default()
        }
    }

    pub fn failing_with(error: ServiceError) -> Self {
        Self {
            outcome: Some(error),
            ..Self::seeded()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn answer<T>(&self, value: T) -> ServiceResult<T> {
        match &self.outcome {
            Some(error) => Err(error.clone()),
            None => Ok(value),
        }
    }

    fn lookup_failure(&self, enabled: bool) -> ServiceResult<()> {
        if enabled {
            Err(ServiceError::Internal("lookup backend unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn vote(&self, pid: &str, uid: Uid, upvoted: bool, downvoted: bool) -> VoteResult {
        VoteResult {
            pid: pid.to_string(),
            uid,
            upvotes: u64::from(upvoted),
            downvotes: u64::from(downvoted),
            votes: i64::from(upvoted) - i64::from(downvoted),
            upvoted,
            downvoted,
        }
    }
}

#[async_trait]
impl UserService for MockForum {
    async fn is_administrator(&self, uid: Uid) -> ServiceResult<bool> {
        self.lookup_failure(self.fail_admin_lookup)?;
        Ok(self.admins.contains(&uid))
    }
    async fn get_uid_by_userslug(&self, userslug: &str) -> ServiceResult<Option<Uid>> {
        self.lookup_failure(self.fail_slug_lookup)?;
        Ok(self.slugs.get(userslug).copied())
    }
    async fn delete(&self, caller: Uid, uid: Uid) -> ServiceResult<()> {
        self.record(format!("delete_user:{caller}:{uid}"));
        self.answer(())
    }
    async fn ban(&self, uid: Uid) -> ServiceResult<()> {
        self.record(format!("ban:{uid}"));
        self.answer(())
    }
    async fn unban(&self, uid: Uid) -> ServiceResult<()> {
        self.record(format!("unban:{uid}"));
        self.answer(())
    }
}

#[async_trait]
impl PostService for MockForum {
    async fn exists(&self, pid: &str) -> ServiceResult<bool> {
        self.lookup_failure(self.fail_exists)?;
        Ok(self.posts.contains(pid))
    }
    async fn edit(&self, payload: EditPayload) -> ServiceResult<()> {
        self.record(format!("edit:{}:{}", payload.pid, payload.uid));
        self.edits.lock().unwrap().push(payload);
        self.answer(())
    }
    async fn purge(&self, pid: &str, uid: Uid) -> ServiceResult<()> {
        self.record(format!("purge_post:{pid}:{uid}"));
        self.answer(())
    }
    async fn delete(&self, pid: &str, uid: Uid) -> ServiceResult<()> {
        self.record(format!("delete_post:{pid}:{uid}"));
        self.answer(())
    }
    async fn restore(&self, pid: &str, uid: Uid) -> ServiceResult<()> {
        self.record(format!("restore_post:{pid}:{uid}"));
        self.answer(())
    }
    async fn upvote(&self, pid: &str, uid: Uid) -> ServiceResult<VoteResult> {
        self.record(format!("upvote:{pid}:{uid}"));
        self.answer(self.vote(pid, uid, true, false))
    }
    async fn downvote(&self, pid: &str, uid: Uid) -> ServiceResult<VoteResult> {
        self.record(format!("downvote:{pid}:{uid}"));
        self.answer(self.vote(pid, uid, false, true))
    }
    async fn unvote(&self, pid: &str, uid: Uid) -> ServiceResult<VoteResult> {
        self.record(format!("unvote:{pid}:{uid}"));
        self.answer(self.vote(pid, uid, false, false))
    }
    async fn bookmark(&self, pid: &str, uid: Uid) -> ServiceResult<()> {
        self.record(format!("bookmark:{pid}:{uid}"));
        self.answer(())
    }
    async fn unbookmark(&self, pid: &str, uid: Uid) -> ServiceResult<()> {
        self.record(format!("unbookmark:{pid}:{uid}"));
        self.answer(())
    }
}

#[async_trait]
impl TopicService for MockForum {
    async fn exists(&self, tid: &str) -> ServiceResult<bool> {
        self.lookup_failure(self.fail_exists)?;
        Ok(self.topics.contains(tid))
    }
    async fn get_post_replies(
        &self,
        pids: &[String],
        uid: Uid,
        recursive_levels: u32,
    ) -> ServiceResult<Vec<Vec<PostReply>>> {
        self.record(format!("replies:{}:{uid}:{recursive_levels}", pids.join(",")));
        let reply = PostReply {
            pid: "43".to_string(),
            tid: "10".to_string(),
            uid: 5,
            content: "first reply".to_string(),
            to_pid: pids.first().cloned(),
            ..Default::default()
        };
        self.answer(pids.iter().map(|_| vec![reply.clone()]).collect())
    }
    async fn reply(&self, payload: ReplyPayload) -> ServiceResult<PostReply> {
        self.record(format!("reply:{}:{}", payload.tid, payload.uid));
        let reply = PostReply {
            pid: "99".to_string(),
            tid: payload.tid.clone(),
            uid: payload.uid,
            content: payload.content.clone(),
            to_pid: payload.to_pid.clone(),
            ..Default::default()
        };
        self.replies.lock().unwrap().push(payload);
        self.answer(reply)
    }
    async fn purge(&self, tid: &str, uid: Uid) -> ServiceResult<()> {
        self.record(format!("purge_topic:{tid}:{uid}"));
        self.answer(())
    }
    async fn delete(&self, tid: &str, uid: Uid) -> ServiceResult<()> {
        self.record(format!("delete_topic:{tid}:{uid}"));
        self.answer(())
    }
    async fn restore(&self, tid: &str, uid: Uid) -> ServiceResult<()> {
        self.record(format!("restore_topic:{tid}:{uid}"));
        self.answer(())
    }
    async fn follow(&self, tid: &str, uid: Uid) -> ServiceResult<()> {
        self.record(format!("follow:{tid}:{uid}"));
        self.answer(())
    }
    async fn unfollow(&self, tid: &str, uid: Uid) -> ServiceResult<()> {
        self.record(format!("unfollow:{tid}:{uid}"));
        self.answer(())
    }
}

#[async_trait]
impl FlagService for MockForum {
    async fn create(&self, flag_type: &str, pid: &str, uid: Uid, reason: &str) -> ServiceResult<()> {
        self.record(format!("flag:{flag_type}:{pid}:{uid}:{reason}"));
        self.answer(())
    }
}

// --- MOCK AUTH PROVIDER ---

pub const USER_TOKEN: &str = "user-7-token";
pub const ADMIN_TOKEN: &str = "admin-1-token";
pub const MASTER_TOKEN: &str = "master-token";
pub const BROKEN_TOKEN: &str = "provider-explodes";
pub const SHAPELESS_TOKEN: &str = "neither-uid-nor-master";

/// Token table with fixed answers. `fail_login` makes every login attempt fail.
#[derive(Default)]
pub struct MockAuth {
    pub fail_login: bool,
    pub logins: Mutex<Vec<Principal>>,
}

impl MockAuth {
    pub fn logins(&self) -> Vec<Principal> {
        self.logins.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthProvider for MockAuth {
    async fn authenticate(&self, token: &str) -> ServiceResult<Option<Principal>> {
        match token {
            USER_TOKEN => Ok(Some(Principal::user(7))),
            ADMIN_TOKEN => Ok(Some(Principal::user(1))),
            MASTER_TOKEN => Ok(Some(Principal::master())),
            SHAPELESS_TOKEN => Ok(Some(Principal::default())),
            BROKEN_TOKEN => Err(ServiceError::Internal("token store offline".to_string())),
            _ => Ok(None),
        }
    }

    async fn login(&self, principal: &Principal) -> ServiceResult<()> {
        self.logins.lock().unwrap().push(principal.clone());
        if self.fail_login {
            Err(ServiceError::Internal("session store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

// --- STATE AND REQUEST HELPERS ---

pub fn state(forum: Arc<MockForum>, auth: Arc<MockAuth>) -> AppState {
    AppState {
        auth,
        users: forum.clone(),
        posts: forum.clone(),
        topics: forum.clone(),
        flags: forum,
    }
}

pub fn app(forum: Arc<MockForum>) -> Router {
    create_router(state(forum, Arc::new(MockAuth::default())))
}

/// Sends one request through `router` and returns the status and the decoded JSON
/// body (`Value::Null` for an empty body).
pub async fn send(
    router: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let authorization = token.map(|token| format!("Bearer {token}"));
    send_raw(router, method, uri, authorization.as_deref(), body).await
}

/// Same as `send`, but with the `Authorization` header value given verbatim.
pub async fn send_raw(
    router: Router,
    method: Method,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(authorization) = authorization {
        builder = builder.header(header::AUTHORIZATION, authorization);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
