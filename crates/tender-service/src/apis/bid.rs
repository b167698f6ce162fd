//! Bid, feedback and review endpoints.

use crate::apis::params::{parse_version, QueryParams};
use crate::apis::{json_body, rights_error};
use crate::server::AppState;
use axum::{
	extract::{rejection::JsonRejection, Path, Query, State},
	Json,
};
use tender_core::CoreError;
use tender_types::{APIError, Bid, CreateBidDto, Feedback, PatchBidDto, Status};
use validator::Validate;

/// Handles POST /api/bids/new.
///
/// An unknown author is reported as 401, an unknown tender as 404.
pub async fn create_bid(
	State(state): State<AppState>,
	body: Result<Json<CreateBidDto>, JsonRejection>,
) -> Result<Json<Bid>, APIError> {
	let dto = json_body(body)?;
	dto.validate()?;

	state
		.engine
		.identity()
		.verify_author_exists(dto.author_type, &dto.author_id)
		.await
		.map_err(|e| match e {
			CoreError::NotFound(_) => APIError::unauthorized("this user does not exist"),
			other => other.into(),
		})?;

	let bid = state.engine.bids().create(dto).await?;
	Ok(Json(bid))
}

/// Handles GET /api/bids/my.
pub async fn my_bids(
	State(state): State<AppState>,
	Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Bid>>, APIError> {
	let params = QueryParams::new(query);
	let pagination = params.pagination()?;

	let bids = state
		.engine
		.bids()
		.get_my(params.get_or_empty("username"))
		.await?;
	Ok(Json(pagination.apply(bids)))
}

/// Handles GET /api/bids/{tenderId}/list.
pub async fn list_bids_for_tender(
	State(state): State<AppState>,
	Path(tender_id): Path<String>,
	Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Bid>>, APIError> {
	let pagination = QueryParams::new(query).pagination()?;

	let bids = state.engine.bids().get_for_tender(&tender_id).await?;
	Ok(Json(pagination.apply(bids)))
}

/// Handles PUT /api/bids/{bidId}/feedback.
///
/// The review text travels in the `bidFeedback` query parameter.
pub async fn create_bid_feedback(
	State(state): State<AppState>,
	Path(bid_id): Path<String>,
	Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Feedback>, APIError> {
	let params = QueryParams::new(query);

	let feedback = state
		.engine
		.bids()
		.create_feedback(
			&bid_id,
			params.get_or_empty("username"),
			params.get_or_empty("bidFeedback"),
		)
		.await?;
	Ok(Json(feedback))
}

/// Handles GET /api/bids/{tenderId}/reviews.
///
/// The author must have bid on the tender (404), and the requester must have
/// rights over the tender (401/403).
pub async fn list_bid_reviews(
	State(state): State<AppState>,
	Path(tender_id): Path<String>,
	Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Feedback>>, APIError> {
	let params = QueryParams::new(query);
	let pagination = params.pagination()?;
	let author = params.get_or_empty("authorUsername");

	state
		.engine
		.bids()
		.check_if_user_bid_exists(&tender_id, author)
		.await
		.map_err(|e| match e {
			CoreError::NotFound(_) => APIError::not_found("tender does not have a user's bid"),
			other => other.into(),
		})?;

	state
		.engine
		.rights()
		.check_tender_right(params.get_or_empty("requesterUsername"), &tender_id)
		.await
		.map_err(rights_error)?;

	let reviews = state.engine.bids().get_all_user_reviews(author).await?;
	Ok(Json(pagination.apply(reviews)))
}

/// Handles GET /api/bids/{bidId}/status.
pub async fn get_bid_status(
	State(state): State<AppState>,
	Path(bid_id): Path<String>,
	Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Status>, APIError> {
	let params = QueryParams::new(query);
	state
		.engine
		.rights()
		.check_bid_right(params.get_or_empty("username"), &bid_id)
		.await
		.map_err(rights_error)?;

	let status = state.engine.bids().get_status(&bid_id).await?;
	Ok(Json(status))
}

/// Handles PUT /api/bids/{bidId}/status.
pub async fn set_bid_status(
	State(state): State<AppState>,
	Path(bid_id): Path<String>,
	Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Bid>, APIError> {
	let params = QueryParams::new(query);
	let status = params.status()?;

	state
		.engine
		.rights()
		.check_bid_right(params.get_or_empty("username"), &bid_id)
		.await
		.map_err(rights_error)?;

	let bid = state.engine.bids().change_status(&bid_id, status).await?;
	Ok(Json(bid))
}

/// Handles PATCH /api/bids/{bidId}/edit.
pub async fn patch_bid(
	State(state): State<AppState>,
	Path(bid_id): Path<String>,
	Query(query): Query<Vec<(String, String)>>,
	body: Result<Json<PatchBidDto>, JsonRejection>,
) -> Result<Json<Bid>, APIError> {
	let dto = json_body(body)?;
	dto.validate()?;

	let params = QueryParams::new(query);
	state
		.engine
		.rights()
		.check_bid_right(params.get_or_empty("username"), &bid_id)
		.await
		.map_err(rights_error)?;

	let bid = state.engine.bids().patch(&bid_id, dto).await?;
	Ok(Json(bid))
}

/// Handles PUT /api/bids/{bidId}/rollback/{version}.
pub async fn rollback_bid(
	State(state): State<AppState>,
	Path((bid_id, version)): Path<(String, String)>,
	Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Bid>, APIError> {
	let version = parse_version(&version)?;
	let params = QueryParams::new(query);
	state
		.engine
		.rights()
		.check_bid_right(params.get_or_empty("username"), &bid_id)
		.await
		.map_err(rights_error)?;

	let bid = state
		.engine
		.bids()
		.rollback_version(&bid_id, version)
		.await?;
	Ok(Json(bid))
}
