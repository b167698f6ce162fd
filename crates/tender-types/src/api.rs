//! API error types for the tender service HTTP API.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed input, length or enum violations (400)
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// The acting identity could not be resolved (401)
	Unauthorized { error_type: String, message: String },
	/// The acting identity lacks rights on the subject (403)
	Forbidden { error_type: String, message: String },
	/// The referenced record does not exist (404)
	NotFound { error_type: String, message: String },
	/// Store failure or undecodable data (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	pub fn bad_request(message: impl Into<String>) -> Self {
		APIError::BadRequest {
			error_type: "BAD_REQUEST".to_string(),
			message: message.into(),
			details: None,
		}
	}

	pub fn unauthorized(message: impl Into<String>) -> Self {
		APIError::Unauthorized {
			error_type: "UNAUTHORIZED".to_string(),
			message: message.into(),
		}
	}

	pub fn forbidden(message: impl Into<String>) -> Self {
		APIError::Forbidden {
			error_type: "FORBIDDEN".to_string(),
			message: message.into(),
		}
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		APIError::NotFound {
			error_type: "NOT_FOUND".to_string(),
			message: message.into(),
		}
	}

	pub fn internal(message: impl Into<String>) -> Self {
		APIError::InternalServerError {
			error_type: "INTERNAL_ERROR".to_string(),
			message: message.into(),
		}
	}

	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> StatusCode {
		match self {
			APIError::BadRequest { .. } => StatusCode::BAD_REQUEST,
			APIError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
			APIError::Forbidden { .. } => StatusCode::FORBIDDEN,
			APIError::NotFound { .. } => StatusCode::NOT_FOUND,
			APIError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			APIError::BadRequest {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			APIError::Unauthorized {
				error_type,
				message,
			}
			| APIError::Forbidden {
				error_type,
				message,
			}
			| APIError::NotFound {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::Unauthorized { message, .. } => write!(f, "Unauthorized: {}", message),
			APIError::Forbidden { message, .. } => write!(f, "Forbidden: {}", message),
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

/// Field-level validation failures become a 400 whose `details` map each
/// offending field to its violated rules.
impl From<validator::ValidationErrors> for APIError {
	fn from(errors: validator::ValidationErrors) -> Self {
		APIError::BadRequest {
			error_type: "BAD_REQUEST".to_string(),
			message: errors.to_string(),
			details: serde_json::to_value(&errors).ok(),
		}
	}
}

impl IntoResponse for APIError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		(status, Json(self.to_error_response())).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_codes() {
		assert_eq!(
			APIError::bad_request("x").status_code(),
			StatusCode::BAD_REQUEST
		);
		assert_eq!(
			APIError::unauthorized("x").status_code(),
			StatusCode::UNAUTHORIZED
		);
		assert_eq!(APIError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
		assert_eq!(APIError::not_found("x").status_code(), StatusCode::NOT_FOUND);
		assert_eq!(
			APIError::internal("x").status_code(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}

	#[test]
	fn test_error_response_omits_empty_details() {
		let body = serde_json::to_value(APIError::forbidden("no rights").to_error_response())
			.unwrap();
		assert_eq!(body["error"], "FORBIDDEN");
		assert_eq!(body["message"], "no rights");
		assert!(body.get("details").is_none());
	}

	#[test]
	fn test_validation_errors_fill_details() {
		use validator::Validate;

		#[derive(Validate)]
		struct Named {
			#[validate(length(max = 3))]
			name: String,
		}

		let errors = Named {
			name: "toolong".into(),
		}
		.validate()
		.unwrap_err();
		let api_error = APIError::from(errors);
		assert_eq!(api_error.status_code(), StatusCode::BAD_REQUEST);

		let body = serde_json::to_value(api_error.to_error_response()).unwrap();
		assert_eq!(body["error"], "BAD_REQUEST");
		assert_eq!(body["details"]["name"][0]["code"], "length");
	}
}
