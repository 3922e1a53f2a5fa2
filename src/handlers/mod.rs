use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::{Map, Value};

use crate::error::ApiError;

pub mod posts;
pub mod topics;
pub mod users;

/// JsonObject
///
/// The request body as a JSON object. An empty body reads as `{}`; anything that is
/// not a JSON object is a 400. Handlers check field presence on this map before
/// reading values, so a missing field and a wrongly typed one are reported differently.
#[derive(Debug, Clone, Default)]
pub struct JsonObject(pub Map<String, Value>);

impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::bad_request())?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(Map::new()));
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(ApiError::bad_request()),
            Err(e) => {
                tracing::debug!(error = %e, "request body is not valid JSON");
                Err(ApiError::bad_request())
            }
        }
    }
}

/// check_required
///
/// 400 `params-missing` listing every name in `required` the body does not contain,
/// in declared order.
pub fn check_required(required: &[&str], body: &Map<String, Value>) -> Result<(), ApiError> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !body.contains_key(*name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        tracing::debug!(?missing, "required parameters missing");
        Err(ApiError::params_missing(missing))
    }
}

/// A scalar body field as text. Numbers and booleans are rendered, `null` and
/// absent fields give `None`, arrays and objects are a 400 naming the field.
pub fn text_field(body: &Map<String, Value>, name: &str) -> Result<Option<String>, ApiError> {
    match body.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(ApiError::bad_request().with_params([name])),
    }
}

/// Like `text_field`, for fields that `check_required` has already vouched for.
pub fn required_text(body: &Map<String, Value>, name: &str) -> Result<String, ApiError> {
    text_field(body, name)?.ok_or_else(|| ApiError::bad_request().with_params([name]))
}

/// An optional text field, dropped when empty.
pub fn optional_text(body: &Map<String, Value>, name: &str) -> Result<Option<String>, ApiError> {
    Ok(text_field(body, name)?.filter(|value| !value.is_empty()))
}
