use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

use crate::{
    error::{ServiceError, ServiceResult},
    models::{EditPayload, Flag, PostReply, ReplyPayload, Uid, VoteResult},
    services::{FlagService, PostService, TopicService, UserService},
};

// --- Records ---

#[derive(Debug, Clone)]
struct UserRecord {
    userslug: String,
    admin: bool,
    banned: bool,
}

#[derive(Debug, Clone)]
struct TopicRecord {
    uid: Uid,
    title: String,
    main_pid: u64,
    deleted: bool,
    tags: Vec<String>,
    thumb: Option<String>,
    followers: HashSet<Uid>,
}

#[derive(Debug, Clone)]
struct PostRecord {
    tid: u64,
    uid: Uid,
    content: String,
    handle: Option<String>,
    to_pid: Option<u64>,
    deleted: bool,
    upvoters: HashSet<Uid>,
    downvoters: HashSet<Uid>,
    bookmarks: HashSet<Uid>,
}

impl PostRecord {
    fn votes(&self) -> i64 {
        self.upvoters.len() as i64 - self.downvoters.len() as i64
    }

    fn to_reply(&self, pid: u64) -> PostReply {
        PostReply {
            pid: pid.to_string(),
            tid: self.tid.to_string(),
            uid: self.uid,
            content: self.content.clone(),
            deleted: self.deleted,
            votes: self.votes(),
            handle: self.handle.clone(),
            to_pid: self.to_pid.map(|p| p.to_string()),
            replies: None,
        }
    }

    fn vote_result(&self, pid: u64, uid: Uid) -> VoteResult {
        VoteResult {
            pid: pid.to_string(),
            uid,
            upvotes: self.upvoters.len() as u64,
            downvotes: self.downvoters.len() as u64,
            votes: self.votes(),
            upvoted: self.upvoters.contains(&uid),
            downvoted: self.downvoters.contains(&uid),
        }
    }
}

#[derive(Debug, Default)]
struct ForumData {
    users: HashMap<Uid, UserRecord>,
    topics: BTreeMap<u64, TopicRecord>,
    posts: BTreeMap<u64, PostRecord>,
    flags: Vec<Flag>,
    next_uid: Uid,
    next_tid: u64,
    next_pid: u64,
}

#[derive(Clone, Copy)]
enum Vote {
    Up,
    Down,
    None,
}

impl ForumData {
    fn user(&self, uid: Uid) -> ServiceResult<&UserRecord> {
        self.users
            .get(&uid)
            .ok_or_else(|| ServiceError::NotFound(format!("user {uid}")))
    }

    fn is_admin(&self, uid: Uid) -> bool {
        self.users.get(&uid).is_some_and(|u| u.admin)
    }

    /// The caller must exist and must not be banned.
    fn active_user(&self, uid: Uid) -> ServiceResult<&UserRecord> {
        let user = self.user(uid)?;
        if user.banned {
            return Err(ServiceError::NoPrivileges);
        }
        Ok(user)
    }

    fn can_moderate(&self, owner: Uid, caller: Uid) -> ServiceResult<()> {
        self.active_user(caller)?;
        if owner == caller || self.is_admin(caller) {
            Ok(())
        } else {
            Err(ServiceError::NoPrivileges)
        }
    }

    fn post_mut(&mut self, pid: u64) -> ServiceResult<&mut PostRecord> {
        self.posts
            .get_mut(&pid)
            .ok_or_else(|| ServiceError::NotFound(format!("post {pid}")))
    }

    fn post(&self, pid: u64) -> ServiceResult<&PostRecord> {
        self.posts
            .get(&pid)
            .ok_or_else(|| ServiceError::NotFound(format!("post {pid}")))
    }

    fn topic(&self, tid: u64) -> ServiceResult<&TopicRecord> {
        self.topics
            .get(&tid)
            .ok_or_else(|| ServiceError::NotFound(format!("topic {tid}")))
    }

    fn topic_mut(&mut self, tid: u64) -> ServiceResult<&mut TopicRecord> {
        self.topics
            .get_mut(&tid)
            .ok_or_else(|| ServiceError::NotFound(format!("topic {tid}")))
    }

    fn insert_post(&mut self, tid: u64, uid: Uid, content: &str, to_pid: Option<u64>) -> u64 {
        self.next_pid += 1;
        let pid = self.next_pid;
        self.posts.insert(
            pid,
            PostRecord {
                tid,
                uid,
                content: content.to_string(),
                handle: None,
                to_pid,
                deleted: false,
                upvoters: HashSet::new(),
                downvoters: HashSet::new(),
                bookmarks: HashSet::new(),
            },
        );
        pid
    }

    fn cast_vote(&mut self, pid: u64, uid: Uid, vote: Vote) -> ServiceResult<VoteResult> {
        self.active_user(uid)?;
        let post = self.post_mut(pid)?;
        if post.deleted {
            return Err(ServiceError::InvalidData("post-deleted".to_string()));
        }
        if post.uid == uid && !matches!(vote, Vote::None) {
            return Err(ServiceError::InvalidData("self-vote".to_string()));
        }

        post.upvoters.remove(&uid);
        post.downvoters.remove(&uid);
        match vote {
            Vote::Up => {
                post.upvoters.insert(uid);
            }
            Vote::Down => {
                post.downvoters.insert(uid);
            }
            Vote::None => {}
        }
        Ok(post.vote_result(pid, uid))
    }

    fn replies_to(&self, pid: u64, levels: u32) -> Vec<PostReply> {
        self.posts
            .iter()
            .filter(|(_, post)| post.to_pid == Some(pid))
            .map(|(&child, post)| {
                let mut reply = post.to_reply(child);
                if levels > 0 {
                    reply.replies = Some(self.replies_to(child, levels - 1));
                }
                reply
            })
            .collect()
    }
}

/// Parses a path id. Anything that is not a plain integer cannot name an entity.
fn parse_id(raw: &str, kind: &str) -> ServiceResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ServiceError::NotFound(format!("{kind} {raw}")))
}

fn slugify(username: &str) -> String {
    username
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() => Some(c),
            ' ' | '-' | '_' => Some('-'),
            _ => None,
        })
        .collect()
}

fn require_content(content: &str) -> ServiceResult<()> {
    if content.trim().is_empty() {
        Err(ServiceError::InvalidData("content-too-short".to_string()))
    } else {
        Ok(())
    }
}

/// InMemoryForum
///
/// A self-contained implementation of every service trait, backed by in-process maps.
/// Used by the binary when no external forum backend is wired in, and by the tests.
#[derive(Default)]
pub struct InMemoryForum {
    data: RwLock<ForumData>,
}

impl InMemoryForum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user and returns its uid. The slug is derived from the username.
    pub async fn create_user(&self, username: &str, admin: bool) -> Uid {
        let mut data = self.data.write().await;
        data.next_uid += 1;
        let uid = data.next_uid;
        data.users.insert(
            uid,
            UserRecord {
                userslug: slugify(username),
                admin,
                banned: false,
            },
        );
        uid
    }

    /// Creates a topic with its main post. Returns `(tid, main_pid)`.
    pub async fn create_topic(&self, uid: Uid, title: &str, content: &str) -> ServiceResult<(u64, u64)> {
        let mut data = self.data.write().await;
        data.active_user(uid)?;
        require_content(content)?;

        data.next_tid += 1;
        let tid = data.next_tid;
        let main_pid = data.insert_post(tid, uid, content, None);
        data.topics.insert(
            tid,
            TopicRecord {
                uid,
                title: title.to_string(),
                main_pid,
                deleted: false,
                tags: Vec::new(),
                thumb: None,
                followers: HashSet::from([uid]),
            },
        );
        Ok((tid, main_pid))
    }

    pub async fn flags(&self) -> Vec<Flag> {
        self.data.read().await.flags.clone()
    }

    pub async fn is_bookmarked(&self, pid: u64, uid: Uid) -> bool {
        self.data
            .read()
            .await
            .posts
            .get(&pid)
            .is_some_and(|p| p.bookmarks.contains(&uid))
    }

    pub async fn is_following(&self, tid: u64, uid: Uid) -> bool {
        self.data
            .read()
            .await
            .topics
            .get(&tid)
            .is_some_and(|t| t.followers.contains(&uid))
    }

    pub async fn post_content(&self, pid: u64) -> Option<String> {
        self.data.read().await.posts.get(&pid).map(|p| p.content.clone())
    }

    pub async fn topic_title(&self, tid: u64) -> Option<String> {
        self.data.read().await.topics.get(&tid).map(|t| t.title.clone())
    }

    pub async fn topic_tags(&self, tid: u64) -> Option<Vec<String>> {
        self.data.read().await.topics.get(&tid).map(|t| t.tags.clone())
    }

    pub async fn topic_thumb(&self, tid: u64) -> Option<String> {
        self.data.read().await.topics.get(&tid).and_then(|t| t.thumb.clone())
    }

    pub async fn is_banned(&self, uid: Uid) -> Option<bool> {
        self.data.read().await.users.get(&uid).map(|u| u.banned)
    }
}

#[async_trait]
impl UserService for InMemoryForum {
    async fn is_administrator(&self, uid: Uid) -> ServiceResult<bool> {
        Ok(self.data.read().await.is_admin(uid))
    }

    async fn get_uid_by_userslug(&self, userslug: &str) -> ServiceResult<Option<Uid>> {
        let data = self.data.read().await;
        Ok(data
            .users
            .iter()
            .find(|(_, user)| user.userslug == userslug)
            .map(|(&uid, _)| uid))
    }

    async fn delete(&self, caller: Uid, uid: Uid) -> ServiceResult<()> {
        let mut data = self.data.write().await;
        data.user(uid)?;
        if caller == uid {
            return Err(ServiceError::InvalidData("cant-delete-self".to_string()));
        }
        data.users.remove(&uid);
        for topic in data.topics.values_mut() {
            topic.followers.remove(&uid);
        }
        Ok(())
    }

    async fn ban(&self, uid: Uid) -> ServiceResult<()> {
        let mut data = self.data.write().await;
        if data.user(uid)?.admin {
            return Err(ServiceError::InvalidData("cant-ban-other-admins".to_string()));
        }
        if let Some(user) = data.users.get_mut(&uid) {
            user.banned = true;
        }
        Ok(())
    }

    async fn unban(&self, uid: Uid) -> ServiceResult<()> {
        let mut data = self.data.write().await;
        data.user(uid)?;
        if let Some(user) = data.users.get_mut(&uid) {
            user.banned = false;
        }
        Ok(())
    }
}

#[async_trait]
impl PostService for InMemoryForum {
    async fn exists(&self, pid: &str) -> ServiceResult<bool> {
        let Ok(pid) = parse_id(pid, "post") else {
            return Ok(false);
        };
        Ok(self.data.read().await.posts.contains_key(&pid))
    }

    async fn edit(&self, payload: EditPayload) -> ServiceResult<()> {
        let pid = parse_id(&payload.pid, "post")?;
        let mut data = self.data.write().await;
        let (tid, owner) = {
            let post = data.post(pid)?;
            (post.tid, post.uid)
        };
        data.can_moderate(owner, payload.uid)?;
        require_content(&payload.content)?;

        let is_main = data.topic(tid)?.main_pid == pid;
        let post = data.post_mut(pid)?;
        post.content = payload.content;
        if payload.handle.is_some() {
            post.handle = payload.handle;
        }

        if is_main {
            let topic = data.topic_mut(tid)?;
            if let Some(title) = payload.title.filter(|t| !t.trim().is_empty()) {
                topic.title = title;
            }
            if let Some(tags) = payload.options.tags {
                topic.tags = tags;
            }
            if let Some(thumb) = payload.options.topic_thumb {
                topic.thumb = Some(thumb);
            }
        }
        Ok(())
    }

    async fn purge(&self, pid: &str, uid: Uid) -> ServiceResult<()> {
        let pid = parse_id(pid, "post")?;
        let mut data = self.data.write().await;
        let (tid, owner) = {
            let post = data.post(pid)?;
            (post.tid, post.uid)
        };
        data.can_moderate(owner, uid)?;
        if data.topic(tid)?.main_pid == pid {
            return Err(ServiceError::InvalidData("cant-purge-main-post".to_string()));
        }

        data.posts.remove(&pid);
        for post in data.posts.values_mut() {
            if post.to_pid == Some(pid) {
                post.to_pid = None;
            }
        }
        Ok(())
    }

    async fn delete(&self, pid: &str, uid: Uid) -> ServiceResult<()> {
        let pid = parse_id(pid, "post")?;
        let mut data = self.data.write().await;
        let owner = data.post(pid)?.uid;
        data.can_moderate(owner, uid)?;

        let post = data.post_mut(pid)?;
        if post.deleted {
            return Err(ServiceError::InvalidData("post-already-deleted".to_string()));
        }
        post.deleted = true;
        Ok(())
    }

    async fn restore(&self, pid: &str, uid: Uid) -> ServiceResult<()> {
        let pid = parse_id(pid, "post")?;
        let mut data = self.data.write().await;
        let owner = data.post(pid)?.uid;
        data.can_moderate(owner, uid)?;

        let post = data.post_mut(pid)?;
        if !post.deleted {
            return Err(ServiceError::InvalidData("post-already-restored".to_string()));
        }
        post.deleted = false;
        Ok(())
    }

    async fn upvote(&self, pid: &str, uid: Uid) -> ServiceResult<VoteResult> {
        let pid = parse_id(pid, "post")?;
        self.data.write().await.cast_vote(pid, uid, Vote::Up)
    }

    async fn downvote(&self, pid: &str, uid: Uid) -> ServiceResult<VoteResult> {
        let pid = parse_id(pid, "post")?;
        self.data.write().await.cast_vote(pid, uid, Vote::Down)
    }

    async fn unvote(&self, pid: &str, uid: Uid) -> ServiceResult<VoteResult> {
        let pid = parse_id(pid, "post")?;
        self.data.write().await.cast_vote(pid, uid, Vote::None)
    }

    async fn bookmark(&self, pid: &str, uid: Uid) -> ServiceResult<()> {
        let pid = parse_id(pid, "post")?;
        let mut data = self.data.write().await;
        data.active_user(uid)?;
        let post = data.post_mut(pid)?;
        if !post.bookmarks.insert(uid) {
            return Err(ServiceError::InvalidData("already-bookmarked".to_string()));
        }
        Ok(())
    }

    async fn unbookmark(&self, pid: &str, uid: Uid) -> ServiceResult<()> {
        let pid = parse_id(pid, "post")?;
        let mut data = self.data.write().await;
        data.active_user(uid)?;
        let post = data.post_mut(pid)?;
        if !post.bookmarks.remove(&uid) {
            return Err(ServiceError::InvalidData("already-unbookmarked".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TopicService for InMemoryForum {
    async fn exists(&self, tid: &str) -> ServiceResult<bool> {
        let Ok(tid) = parse_id(tid, "topic") else {
            return Ok(false);
        };
        Ok(self.data.read().await.topics.contains_key(&tid))
    }

    async fn get_post_replies(
        &self,
        pids: &[String],
        _uid: Uid,
        recursive_levels: u32,
    ) -> ServiceResult<Vec<Vec<PostReply>>> {
        let data = self.data.read().await;
        Ok(pids
            .iter()
            .map(|pid| match pid.trim().parse::<u64>() {
                Ok(pid) => data.replies_to(pid, recursive_levels),
                Err(_) => Vec::new(),
            })
            .collect())
    }

    async fn reply(&self, payload: ReplyPayload) -> ServiceResult<PostReply> {
        let tid = parse_id(&payload.tid, "topic")?;
        let to_pid = payload
            .to_pid
            .as_deref()
            .map(|pid| parse_id(pid, "post"))
            .transpose()?;

        let mut data = self.data.write().await;
        data.active_user(payload.uid)?;
        if data.topic(tid)?.deleted {
            return Err(ServiceError::InvalidData("topic-deleted".to_string()));
        }
        if let Some(parent) = to_pid {
            if data.post(parent)?.tid != tid {
                return Err(ServiceError::InvalidData("invalid-pid".to_string()));
            }
        }
        require_content(&payload.content)?;

        let pid = data.insert_post(tid, payload.uid, &payload.content, to_pid);
        data.post(pid).map(|post| post.to_reply(pid))
    }

    async fn purge(&self, tid: &str, uid: Uid) -> ServiceResult<()> {
        let tid = parse_id(tid, "topic")?;
        let mut data = self.data.write().await;
        let owner = data.topic(tid)?.uid;
        data.can_moderate(owner, uid)?;

        data.topics.remove(&tid);
        data.posts.retain(|_, post| post.tid != tid);
        Ok(())
    }

    async fn delete(&self, tid: &str, uid: Uid) -> ServiceResult<()> {
        let tid = parse_id(tid, "topic")?;
        let mut data = self.data.write().await;
        let owner = data.topic(tid)?.uid;
        data.can_moderate(owner, uid)?;

        let topic = data.topic_mut(tid)?;
        if topic.deleted {
            return Err(ServiceError::InvalidData("topic-already-deleted".to_string()));
        }
        topic.deleted = true;
        Ok(())
    }

    async fn restore(&self, tid: &str, uid: Uid) -> ServiceResult<()> {
        let tid = parse_id(tid, "topic")?;
        let mut data = self.data.write().await;
        let owner = data.topic(tid)?.uid;
        data.can_moderate(owner, uid)?;

        let topic = data.topic_mut(tid)?;
        if !topic.deleted {
            return Err(ServiceError::InvalidData("topic-already-restored".to_string()));
        }
        topic.deleted = false;
        Ok(())
    }

    async fn follow(&self, tid: &str, uid: Uid) -> ServiceResult<()> {
        let tid = parse_id(tid, "topic")?;
        let mut data = self.data.write().await;
        data.active_user(uid)?;
        data.topic_mut(tid)?.followers.insert(uid);
        Ok(())
    }

    async fn unfollow(&self, tid: &str, uid: Uid) -> ServiceResult<()> {
        let tid = parse_id(tid, "topic")?;
        let mut data = self.data.write().await;
        data.active_user(uid)?;
        data.topic_mut(tid)?.followers.remove(&uid);
        Ok(())
    }
}

#[async_trait]
impl FlagService for InMemoryForum {
    async fn create(&self, flag_type: &str, pid: &str, uid: Uid, reason: &str) -> ServiceResult<()> {
        if flag_type.trim().is_empty() {
            return Err(ServiceError::InvalidData("invalid-flag-type".to_string()));
        }
        let post_id = parse_id(pid, "post")?;
        let pid = post_id.to_string();

        let mut data = self.data.write().await;
        data.active_user(uid)?;
        data.post(post_id)?;
        let already = data
            .flags
            .iter()
            .any(|flag| flag.pid == pid && flag.reporter == uid && flag.flag_type == flag_type);
        if already {
            return Err(ServiceError::InvalidData("already-flagged".to_string()));
        }

        let flag_id = data.flags.len() as u64 + 1;
        data.flags.push(Flag {
            flag_id,
            flag_type: flag_type.to_string(),
            pid: pid.clone(),
            reporter: uid,
            reason: reason.to_string(),
            created_at: Utc::now(),
        });
        tracing::info!(flag_id, %pid, uid, "post flagged");
        Ok(())
    }
}
