use async_trait::async_trait;
use axum::http::HeaderMap;
use headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{ServiceError, ServiceResult},
    models::Uid,
};

/// Principal
///
/// What the authentication provider hands back for a valid credential.
/// A per-user token carries `uid`; a master token carries `master = true` and no uid,
/// and must be paired with an explicit `_uid` on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub uid: Option<Uid>,
    #[serde(default)]
    pub master: bool,
}

impl Principal {
    pub fn user(uid: Uid) -> Self {
        Self {
            uid: Some(uid),
            master: false,
        }
    }

    pub fn master() -> Self {
        Self {
            uid: None,
            master: true,
        }
    }

    pub fn has_uid(&self) -> bool {
        self.uid.is_some()
    }

    pub fn is_master(&self) -> bool {
        self.master
    }

    /// Turns a master principal into a per-user one acting as `uid`.
    pub fn promote(self, uid: Uid) -> Self {
        Self {
            uid: Some(uid),
            master: false,
        }
    }
}

/// Claims
///
/// Payload of a signed bearer token. `sub` is the numeric user id rendered as a string.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn for_user(uid: Uid, ttl_secs: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: uid.to_string(),
            iat: now.max(0) as usize,
            exp: (now + ttl_secs).max(0) as usize,
        }
    }
}

/// Signs an HS256 token for `uid` that `TokenAuthProvider` will accept.
pub fn sign_token(secret: &str, uid: Uid, ttl_secs: i64) -> ServiceResult<String> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &Claims::for_user(uid, ttl_secs), &key)
        .map_err(|e| ServiceError::Internal(e.to_string()))
}

/// Pulls the credential out of `Authorization: Bearer <token>`.
/// The scheme name matches case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let Authorization(bearer) = headers.typed_get::<Authorization<Bearer>>()?;
    let token = bearer.token().trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// AuthProvider
///
/// External authentication capability consumed by `require_user`.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// `Ok(None)` means the credential was rejected. `Err` means the provider itself failed.
    async fn authenticate(&self, token: &str) -> ServiceResult<Option<Principal>>;

    /// Establishes a session for an already-resolved per-user principal.
    async fn login(&self, principal: &Principal) -> ServiceResult<()>;
}

pub type AuthState = Arc<dyn AuthProvider>;

/// TokenAuthProvider
///
/// Validates opaque tokens against an in-memory token table and, when a secret is
/// configured, JWTs signed with that secret.
pub struct TokenAuthProvider {
    tokens: RwLock<HashMap<String, Principal>>,
    jwt_secret: Option<String>,
}

impl TokenAuthProvider {
    pub fn new(jwt_secret: Option<String>) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            jwt_secret,
        }
    }

    /// Builds the provider from configuration, seeding the master token if one is set.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut tokens = HashMap::new();
        if let Some(master) = &config.master_token {
            tokens.insert(master.clone(), Principal::master());
        }
        Self {
            tokens: RwLock::new(tokens),
            jwt_secret: Some(config.jwt_secret.clone()),
        }
    }

    pub async fn insert_token(&self, token: impl Into<String>, principal: Principal) {
        self.tokens.write().await.insert(token.into(), principal);
    }

    pub async fn issue_user_token(&self, uid: Uid) -> String {
        let token = Uuid::new_v4().to_string();
        self.insert_token(token.clone(), Principal::user(uid)).await;
        token
    }

    pub async fn issue_master_token(&self) -> String {
        let token = Uuid::new_v4().to_string();
        self.insert_token(token.clone(), Principal::master()).await;
        token
    }

    /// Returns true if the token existed.
    pub async fn revoke(&self, token: &str) -> bool {
        self.tokens.write().await.remove(token).is_some()
    }

    fn decode_jwt(&self, secret: &str, token: &str) -> Option<Principal> {
        let key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        match decode::<Claims>(token, &key, &validation) {
            Ok(data) => match data.claims.sub.parse::<Uid>() {
                Ok(uid) => Some(Principal::user(uid)),
                Err(_) => {
                    tracing::warn!(sub = %data.claims.sub, "jwt subject is not a numeric uid");
                    None
                }
            },
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("jwt expired"),
                    _ => tracing::debug!(error = %e, "jwt rejected"),
                }
                None
            }
        }
    }
}

fn looks_like_jwt(token: &str) -> bool {
    token.split('.').count() == 3
}

#[async_trait]
impl AuthProvider for TokenAuthProvider {
    async fn authenticate(&self, token: &str) -> ServiceResult<Option<Principal>> {
        if let Some(secret) = &self.jwt_secret {
            if looks_like_jwt(token) {
                return Ok(self.decode_jwt(secret, token));
            }
        }

        Ok(self.tokens.read().await.get(token).cloned())
    }

    async fn login(&self, principal: &Principal) -> ServiceResult<()> {
        // Sessions are stateless here; only a resolved identity may log in.
        if principal.has_uid() && !principal.is_master() {
            Ok(())
        } else {
            Err(ServiceError::Internal(
                "login attempted without a resolved uid".to_string(),
            ))
        }
    }
}
