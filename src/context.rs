use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
};
use serde::{Deserialize, Serialize};

use crate::{auth::Principal, error::ApiError, models::Uid};

/// RequestContext
///
/// Everything the middleware pipeline has established about the current request.
/// Stages never mutate a context in place: each one derives a new copy and stores it
/// in the request extensions before handing the request on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Set by `require_user` once the caller has a resolved identity.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub principal: Option<Principal>,
    /// Set by `expose_uid` from the `userslug` path parameter.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resolved_uid: Option<Uid>,
}

impl RequestContext {
    /// The context attached to `request`, or an empty one.
    pub fn of(request: &Request) -> Self {
        request
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default()
    }

    pub fn with_principal(&self, principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            ..self.clone()
        }
    }

    pub fn with_resolved_uid(&self, uid: Uid) -> Self {
        Self {
            resolved_uid: Some(uid),
            ..self.clone()
        }
    }

    /// The acting user's id.
    pub fn uid(&self) -> Option<Uid> {
        self.principal.as_ref().and_then(|p| p.uid)
    }

    pub fn is_authenticated(&self) -> bool {
        self.uid().is_some()
    }

    /// Stores this context on `request`, replacing whatever an earlier stage left there.
    pub fn bind(self, mut request: Request) -> Request {
        request.extensions_mut().insert(self);
        request
    }
}

/// AuthUser
///
/// The acting user, as established by `require_user`. Handlers take this as an
/// argument; if the route is not behind `require_user` extraction fails with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: Uid,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(RequestContext::uid)
            .map(|uid| AuthUser { uid })
            .ok_or_else(ApiError::unauthorized)
    }
}

/// ResolvedUser
///
/// The user named by the `userslug` path parameter, as resolved by `expose_uid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedUser {
    pub uid: Uid,
}

impl<S> FromRequestParts<S> for ResolvedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.resolved_uid)
            .map(|uid| ResolvedUser { uid })
            .ok_or_else(ApiError::not_found)
    }
}
