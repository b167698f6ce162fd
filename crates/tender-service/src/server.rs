//! HTTP server for the tender service API.
//!
//! Routes are nested under `/api`. Request tracing, CORS and the body size
//! limit are applied to every route.

use crate::apis::{bid, tender};
use axum::{
	extract::DefaultBodyLimit,
	http::{HeaderName, HeaderValue, Method},
	response::Json,
	routing::{get, patch, post, put},
	Router,
};
use std::sync::Arc;
use tender_config::{ApiConfig, CorsConfig};
use tender_core::TenderEngine;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Engine that serves every request.
	pub engine: Arc<TenderEngine>,
}

/// Starts the HTTP server and runs it until Ctrl+C.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<TenderEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = build_router(AppState { engine }, &api_config)?;

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Tender API server starting on {}", bind_address);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	Ok(())
}

async fn shutdown_signal() {
	match tokio::signal::ctrl_c().await {
		Ok(()) => tracing::info!("Shutdown signal received"),
		Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
	}
}

/// Builds the API router with all middleware applied.
pub fn build_router(
	state: AppState,
	api_config: &ApiConfig,
) -> Result<Router, Box<dyn std::error::Error>> {
	let cors = match &api_config.cors {
		Some(cors_config) => cors_layer(cors_config)?,
		None => CorsLayer::permissive(),
	};

	let api = Router::new()
		.route("/ping", get(ping))
		.route("/tenders", get(tender::list_tenders))
		.route("/tenders/new", post(tender::create_tender))
		.route("/tenders/my", get(tender::my_tenders))
		.route(
			"/tenders/{id}/status",
			get(tender::get_tender_status).put(tender::set_tender_status),
		)
		.route("/tenders/{id}/edit", patch(tender::patch_tender))
		.route(
			"/tenders/{id}/rollback/{version}",
			put(tender::rollback_tender),
		)
		.route("/bids/new", post(bid::create_bid))
		.route("/bids/my", get(bid::my_bids))
		// One parameter name per segment: `{id}` is a tender id for `list`
		// and `reviews` and a bid id everywhere else.
		.route("/bids/{id}/list", get(bid::list_bids_for_tender))
		.route("/bids/{id}/feedback", put(bid::create_bid_feedback))
		.route("/bids/{id}/reviews", get(bid::list_bid_reviews))
		.route(
			"/bids/{id}/status",
			get(bid::get_bid_status).put(bid::set_bid_status),
		)
		.route("/bids/{id}/edit", patch(bid::patch_bid))
		.route("/bids/{id}/rollback/{version}", put(bid::rollback_bid));

	Ok(Router::new()
		.nest("/api", api)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(cors)
				.layer(DefaultBodyLimit::max(api_config.max_request_size)),
		)
		.with_state(state))
}

fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, Box<dyn std::error::Error>> {
	let origins = if config.allowed_origins.iter().any(|o| o == "*") {
		AllowOrigin::from(Any)
	} else {
		let origins = config
			.allowed_origins
			.iter()
			.map(|o| o.parse::<HeaderValue>())
			.collect::<Result<Vec<_>, _>>()?;
		AllowOrigin::list(origins)
	};
	let headers = config
		.allowed_headers
		.iter()
		.map(|h| h.parse::<HeaderName>())
		.collect::<Result<Vec<_>, _>>()?;
	let methods = config
		.allowed_methods
		.iter()
		.map(|m| m.parse::<Method>())
		.collect::<Result<Vec<_>, _>>()?;

	Ok(CorsLayer::new()
		.allow_origin(origins)
		.allow_headers(headers)
		.allow_methods(methods))
}

/// Handles GET /api/ping.
async fn ping() -> Json<&'static str> {
	Json("ok")
}
