use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::{HeaderMap, Result as HttpResponse, StatusCode, header::LOCATION};
use serde_json::json;

use selfservice::{
    AuthError, ChallengeOutcome, ErrorCode, ErrorEnvelope, RelayError, SessionError,
};

pub(crate) const NOT_AUTHENTICATED: &str = "You are not authenticated";

/// Helper trait for converting errors to a standard response error format
pub(super) trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

impl<T> IntoResponseError<T> for Result<T, SessionError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| match e {
            SessionError::InvalidSession => (StatusCode::UNAUTHORIZED, e.to_string()),
            SessionError::Utils(_) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        })
    }
}

impl<T> IntoResponseError<T> for Result<T, RelayError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            let status = match e {
                RelayError::UnknownAction(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::SERVICE_UNAVAILABLE,
            };
            (status, e.to_string())
        })
    }
}

impl<T> IntoResponseError<T> for Result<T, AuthError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
    }
}

/// Implementation for http::Error (used by Response::builder())
impl<T> IntoResponseError<T> for HttpResponse<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }
}

/// The uniform JSON envelope, delivered with `200 OK` for the page scripts
pub(crate) fn envelope_response<E: ErrorCode + ?Sized>(err: &E) -> Response {
    Json(ErrorEnvelope::from_error(err)).into_response()
}

/// `503` with the diagnostics of a failed remote call
pub(crate) fn unavailable_response<E: ErrorCode + ?Sized>(err: &E, url: &str) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "code": err.error_code(),
            "reason": err.to_string(),
            "url": url,
        })),
    )
        .into_response()
}

/// Turn a challenge or guard decision into a response
///
/// `None` means the request goes on to its handler.
pub(crate) fn outcome_response(outcome: ChallengeOutcome) -> Option<Response> {
    match outcome {
        ChallengeOutcome::Continue => None,
        ChallengeOutcome::Redirect { location, headers } => Some(found(&location, headers)),
        ChallengeOutcome::Reject { status, reason } => Some((status, reason).into_response()),
    }
}

/// `302 Found` to `location` with extra `headers`
pub(crate) fn found(location: &str, mut headers: HeaderMap) -> Response {
    match location.parse() {
        Ok(value) => {
            headers.insert(LOCATION, value);
            (StatusCode::FOUND, headers).into_response()
        }
        Err(_) => {
            tracing::error!("Invalid redirect location: {}", location);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
