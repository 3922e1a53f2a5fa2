use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// ServiceError
///
/// The failure type returned by every service trait and by the authentication provider.
/// The variants are the only distinctions the HTTP layer cares about; anything else
/// a backing store can go wrong with is folded into `Internal`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    /// The referenced post, topic, user or token does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller is known but may not perform this operation.
    #[error("no privileges")]
    NoPrivileges,

    /// The input was understood but rejected (too short, already flagged, ...).
    /// The message is safe to return to the client.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Unexpected fault inside a collaborator. Never shown to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// ApiErrorBody
///
/// The uniform JSON error shape returned by every middleware stage and handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorBody {
    /// HTTP status code, repeated in the body.
    pub code: u16,
    /// Machine readable slug, e.g. `params-missing`.
    pub status: String,
    pub message: String,
    /// Names of the missing or invalid parameters, when relevant.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub params: Option<Vec<String>>,
}

/// ApiError
///
/// A terminal response. Returning it from a middleware or handler ends the request;
/// nothing downstream runs afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, slug: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                code: status.as_u16(),
                status: slug.to_string(),
                message: message.into(),
                params: None,
            },
        }
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.body.params = Some(params.into_iter().map(Into::into).collect());
        self
    }

    /// 400 listing the required fields that were absent.
    pub fn params_missing<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            StatusCode::BAD_REQUEST,
            "params-missing",
            "Required parameters were missing from this API call, please see the \"params\" property",
        )
        .with_params(missing)
    }

    pub fn bad_request() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "bad-request",
            "Something was wrong with the request payload you passed in.",
        )
    }

    /// 401. Used for both missing credentials and insufficient privilege at the gate.
    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "not-authorised",
            "A valid login session was not found. Please log in and try again.",
        )
    }

    pub fn forbidden() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "forbidden",
            "You are not authorised to make this call",
        )
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not-found", "Invalid API call")
    }

    pub fn method_not_allowed() -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "method-not-allowed",
            "This route does not accept that method",
        )
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "unexpected-error",
            "Something went wrong while processing your request.",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ApiErrorBody {
        &self.body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Translates a collaborator failure into the response the client sees.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => {
                tracing::debug!(%what, "service reported missing entity");
                ApiError::not_found()
            }
            ServiceError::NoPrivileges => ApiError::forbidden(),
            ServiceError::InvalidData(message) => {
                ApiError::new(StatusCode::BAD_REQUEST, "bad-request", message)
            }
            ServiceError::Internal(detail) => {
                tracing::error!(error = %detail, "service call failed");
                ApiError::internal()
            }
        }
    }
}

/// Empty
///
/// Serializes as `{}`. Used as the payload of operations that return nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Empty {}

/// ApiResponse
///
/// Success envelope: `{ "code": 200, "status": "ok", "payload": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub status: String,
    pub payload: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            status: "ok".to_string(),
            payload,
        }
    }

    /// Maps a service outcome: payload forwarded verbatim on success,
    /// translated error otherwise.
    pub fn from_result(result: ServiceResult<T>) -> Result<Json<Self>, ApiError> {
        result.map(|payload| Json(Self::ok(payload))).map_err(ApiError::from)
    }
}

impl ApiResponse<Empty> {
    /// Same as `from_result` for operations without a payload.
    pub fn from_unit(result: ServiceResult<()>) -> Result<Json<Self>, ApiError> {
        ApiResponse::from_result(result.map(|()| Empty::default()))
    }
}
