//! Request handlers for the tender service API.

pub mod bid;
pub mod params;
pub mod tender;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use tender_core::CoreError;
use tender_types::APIError;

/// Maps a failed identity or rights check.
///
/// An acting user or subject that cannot be resolved is reported as 401; an
/// existing user without authority as 403.
pub fn rights_error(err: CoreError) -> APIError {
	tracing::warn!("Rights check failed: {}", err);
	match err {
		CoreError::NotFound(message) => APIError::unauthorized(message),
		CoreError::NoRights(message) => APIError::forbidden(message),
		other => other.into(),
	}
}

/// Unwraps a JSON body, reporting malformed input as 400.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, APIError> {
	body.map(|Json(value)| value)
		.map_err(|rejection| APIError::bad_request(rejection.body_text()))
}
