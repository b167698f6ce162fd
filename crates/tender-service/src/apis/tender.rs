//! Tender endpoints.
//!
//! Every mutating handler runs the rights check before calling into the
//! engine, so an unauthorized request never reaches storage.

use crate::apis::params::{parse_version, QueryParams};
use crate::apis::{json_body, rights_error};
use crate::server::AppState;
use axum::{
	extract::{rejection::JsonRejection, Path, Query, State},
	Json,
};
use tender_types::{APIError, CreateTenderDto, PatchTenderDto, Status, Tender};
use validator::Validate;

/// Handles GET /api/tenders.
pub async fn list_tenders(
	State(state): State<AppState>,
	Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Tender>>, APIError> {
	let params = QueryParams::new(query);
	let service_types = params.service_types()?;
	let pagination = params.pagination()?;

	let tenders = state.engine.tenders().get_all(&service_types).await?;
	Ok(Json(pagination.apply(tenders)))
}

/// Handles POST /api/tenders/new.
///
/// The creator named in the body must be responsible for the organization.
pub async fn create_tender(
	State(state): State<AppState>,
	body: Result<Json<CreateTenderDto>, JsonRejection>,
) -> Result<Json<Tender>, APIError> {
	let dto = json_body(body)?;
	dto.validate()?;

	state
		.engine
		.rights()
		.check_org_right(&dto.creator_username, &dto.organization_id)
		.await
		.map_err(rights_error)?;

	let tender = state.engine.tenders().create(dto).await?;
	Ok(Json(tender))
}

/// Handles GET /api/tenders/my.
pub async fn my_tenders(
	State(state): State<AppState>,
	Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Tender>>, APIError> {
	let params = QueryParams::new(query);
	let pagination = params.pagination()?;

	let tenders = state
		.engine
		.tenders()
		.get_my(params.get_or_empty("username"))
		.await?;
	Ok(Json(pagination.apply(tenders)))
}

/// Handles GET /api/tenders/{id}/status.
pub async fn get_tender_status(
	State(state): State<AppState>,
	Path(tender_id): Path<String>,
	Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Status>, APIError> {
	let params = QueryParams::new(query);
	state
		.engine
		.rights()
		.check_tender_right(params.get_or_empty("username"), &tender_id)
		.await
		.map_err(rights_error)?;

	let status = state.engine.tenders().get_status(&tender_id).await?;
	Ok(Json(status))
}

/// Handles PUT /api/tenders/{id}/status.
pub async fn set_tender_status(
	State(state): State<AppState>,
	Path(tender_id): Path<String>,
	Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Tender>, APIError> {
	let params = QueryParams::new(query);
	let status = params.status()?;

	state
		.engine
		.rights()
		.check_tender_right(params.get_or_empty("username"), &tender_id)
		.await
		.map_err(rights_error)?;

	let tender = state
		.engine
		.tenders()
		.change_status(&tender_id, status)
		.await?;
	Ok(Json(tender))
}

/// Handles PATCH /api/tenders/{id}/edit.
pub async fn patch_tender(
	State(state): State<AppState>,
	Path(tender_id): Path<String>,
	Query(query): Query<Vec<(String, String)>>,
	body: Result<Json<PatchTenderDto>, JsonRejection>,
) -> Result<Json<Tender>, APIError> {
	let params = QueryParams::new(query);
	state
		.engine
		.rights()
		.check_tender_right(params.get_or_empty("username"), &tender_id)
		.await
		.map_err(rights_error)?;

	let dto = json_body(body)?;
	dto.validate()?;
	let tender = state.engine.tenders().patch(&tender_id, dto).await?;
	Ok(Json(tender))
}

/// Handles PUT /api/tenders/{id}/rollback/{version}.
pub async fn rollback_tender(
	State(state): State<AppState>,
	Path((tender_id, version)): Path<(String, String)>,
	Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Tender>, APIError> {
	let version = parse_version(&version)?;
	let params = QueryParams::new(query);
	state
		.engine
		.rights()
		.check_tender_right(params.get_or_empty("username"), &tender_id)
		.await
		.map_err(rights_error)?;

	let tender = state
		.engine
		.tenders()
		.rollback_version(&tender_id, version)
		.await?;
	Ok(Json(tender))
}
