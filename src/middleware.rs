use axum::{
    body::Body,
    extract::{FromRequestParts, Path, Query, Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::collections::HashMap;

use crate::{
    auth::{AuthState, bearer_token},
    context::RequestContext,
    error::{ApiError, ServiceResult},
    models::Uid,
    services::{PostState, TopicState, UserState},
};

/// Parameter a master-token caller uses to name the user it acts for.
pub const TARGET_UID_PARAM: &str = "_uid";

// Upper bound on the body buffered while looking for `_uid`.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// require_user
///
/// Authenticates the bearer credential and binds the acting user into the
/// `RequestContext`.
///
/// * no credential or rejected credential -> 401
/// * provider failure -> 500
/// * per-user principal -> login, continue
/// * master principal -> `_uid` from body or query is required (400 otherwise);
///   the principal is promoted to that uid and loses its master flag
/// * any other principal shape -> 500
pub async fn require_user(
    State(auth): State<AuthState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request = authenticate(&auth, request).await?;
    Ok(next.run(request).await)
}

/// The body of `require_user`, usable on its own.
pub async fn authenticate(auth: &AuthState, request: Request) -> Result<Request, ApiError> {
    let Some(token) = bearer_token(request.headers()) else {
        tracing::debug!("request carries no bearer credential");
        return Err(ApiError::unauthorized());
    };

    let principal = auth.authenticate(&token).await.map_err(|e| {
        tracing::error!(error = %e, "authentication provider failed");
        ApiError::internal()
    })?;

    let Some(principal) = principal else {
        tracing::warn!("bearer credential rejected");
        return Err(ApiError::unauthorized());
    };

    let (request, principal) = if principal.has_uid() {
        (request, principal)
    } else if principal.is_master() {
        let (request, target) = take_target_uid(request).await?;
        let Some(uid) = target else {
            tracing::debug!("master credential used without _uid");
            return Err(ApiError::params_missing([TARGET_UID_PARAM]));
        };
        tracing::debug!(uid, "master credential acting on behalf of user");
        (request, principal.promote(uid))
    } else {
        tracing::error!(?principal, "provider returned a principal with neither uid nor master flag");
        return Err(ApiError::internal());
    };

    auth.login(&principal).await.map_err(|e| {
        tracing::error!(error = %e, uid = ?principal.uid, "session could not be established");
        ApiError::internal()
    })?;

    let context = RequestContext::of(&request).with_principal(principal);
    Ok(context.bind(request))
}

/// Looks for `_uid` in the JSON body first, then in the query string.
///
/// The body is buffered and put back so downstream extractors still see it.
async fn take_target_uid(request: Request) -> Result<(Request, Option<Uid>), ApiError> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, BODY_LIMIT).await.map_err(|e| {
        tracing::debug!(error = %e, "request body could not be buffered");
        ApiError::bad_request()
    })?;

    let from_body = serde_json::from_slice::<Value>(&bytes)
        .ok()
        .and_then(|value| value.get(TARGET_UID_PARAM).cloned())
        .filter(|value| !value.is_null());

    let raw = match from_body {
        Some(value) => Some(value),
        None => Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(mut query)| query.remove(TARGET_UID_PARAM))
            .map(Value::String),
    };

    let request = Request::from_parts(parts, Body::from(bytes));

    let uid = match raw {
        None => None,
        Some(value) => match parse_uid(&value) {
            Some(uid) => Some(uid),
            None => {
                tracing::debug!(%value, "_uid is not a valid user id");
                return Err(ApiError::bad_request().with_params([TARGET_UID_PARAM]));
            }
        },
    };

    Ok((request, uid))
}

fn parse_uid(value: &Value) -> Option<Uid> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// require_admin
///
/// Only lets administrators through. Must run after `require_user`.
/// Every refusal, including a failed lookup, is a 401: this layer does not
/// distinguish "not allowed" from "not authenticated".
pub async fn require_admin(
    State(users): State<UserState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(uid) = RequestContext::of(&request).uid() else {
        return Err(ApiError::unauthorized());
    };

    match users.is_administrator(uid).await {
        Ok(true) => Ok(next.run(request).await),
        Ok(false) => {
            tracing::debug!(uid, "non-administrator refused at admin gate");
            Err(ApiError::unauthorized())
        }
        Err(e) => {
            tracing::warn!(error = %e, uid, "administrator lookup failed");
            Err(ApiError::unauthorized())
        }
    }
}

/// expose_uid
///
/// Resolves the `userslug` path parameter to a uid. An unknown slug is a 404,
/// a failed lookup a 500. Routes without the parameter pass straight through.
pub async fn expose_uid(
    State(users): State<UserState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (request, params) = path_params(request).await;
    let Some(userslug) = params.get("userslug") else {
        return Ok(next.run(request).await);
    };

    let uid = match users.get_uid_by_userslug(userslug).await {
        Ok(Some(uid)) => uid,
        Ok(None) => {
            tracing::debug!(%userslug, "unknown userslug");
            return Err(ApiError::not_found());
        }
        Err(e) => {
            tracing::error!(error = %e, %userslug, "userslug lookup failed");
            return Err(ApiError::internal());
        }
    };

    let context = RequestContext::of(&request).with_resolved_uid(uid);
    Ok(next.run(context.bind(request)).await)
}

/// validate_tid
///
/// Requires the `tid` path parameter to name an existing topic.
pub async fn validate_tid(
    State(topics): State<TopicState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (request, params) = path_params(request).await;
    let Some(tid) = params.get("tid") else {
        return Err(ApiError::not_found());
    };

    ensure_exists("topic", tid, topics.exists(tid).await)?;
    Ok(next.run(request).await)
}

/// validate_pid
///
/// Requires the `pid` path parameter to name an existing post.
pub async fn validate_pid(
    State(posts): State<PostState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (request, params) = path_params(request).await;
    let Some(pid) = params.get("pid") else {
        return Err(ApiError::not_found());
    };

    ensure_exists("post", pid, posts.exists(pid).await)?;
    Ok(next.run(request).await)
}

fn ensure_exists(kind: &str, id: &str, outcome: ServiceResult<bool>) -> Result<(), ApiError> {
    match outcome {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::debug!(kind, id, "referenced entity does not exist");
            Err(ApiError::not_found())
        }
        Err(e) => {
            tracing::error!(error = %e, kind, id, "existence check failed");
            Err(ApiError::internal())
        }
    }
}

/// Matched path parameters of the route, empty when it has none.
async fn path_params(request: Request) -> (Request, HashMap<String, String>) {
    let (mut parts, body) = request.into_parts();
    let params = Path::<HashMap<String, String>>::from_request_parts(&mut parts, &())
        .await
        .map(|Path(params)| params)
        .unwrap_or_default();
    (Request::from_parts(parts, body), params)
}
