//! Core engine for the tender service.
//!
//! This module ties together identity resolution, rights evaluation, the
//! version store and the tender/bid lifecycle managers on top of one shared
//! storage service. The HTTP layer talks to a [`TenderEngine`] only.

use std::sync::Arc;
use tender_config::Config;
use tender_storage::{StorageError, StorageService};
use tender_types::APIError;
use thiserror::Error;

pub mod auth;
pub mod builder;
mod clock;
pub mod directory;
pub mod lifecycle;
pub mod versions;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{IdentityResolver, RightsEvaluator};
pub use builder::{BuilderError, EngineBuilder};
pub use directory::Directory;
pub use lifecycle::{BidManager, TenderManager};
pub use versions::{VersionStore, Versioned};

/// Errors produced by core operations.
///
/// Rights and identity checks return these unchanged so the caller can decide
/// how a missing identity is reported.
#[derive(Debug, Error)]
pub enum CoreError {
	/// A referenced entity or identity does not exist.
	#[error("{0}")]
	NotFound(String),
	/// The entity exists but the caller has no authority over it.
	#[error("{0}")]
	NoRights(String),
	/// Malformed input.
	#[error("{0}")]
	Validation(String),
	/// Storage failure or undecodable data.
	#[error("{0}")]
	Internal(String),
}

impl From<StorageError> for CoreError {
	fn from(err: StorageError) -> Self {
		match err {
			StorageError::NotFound => CoreError::NotFound("record not found".into()),
			other => CoreError::Internal(other.to_string()),
		}
	}
}

impl From<validator::ValidationErrors> for CoreError {
	fn from(err: validator::ValidationErrors) -> Self {
		CoreError::Validation(err.to_string())
	}
}

impl From<CoreError> for APIError {
	fn from(err: CoreError) -> Self {
		match err {
			CoreError::NotFound(message) => APIError::not_found(message),
			CoreError::NoRights(message) => APIError::forbidden(message),
			CoreError::Validation(message) => APIError::bad_request(message),
			CoreError::Internal(message) => APIError::internal(message),
		}
	}
}

/// Entry point for every tender and bid operation.
pub struct TenderEngine {
	config: Config,
	storage: Arc<StorageService>,
	identity: Arc<IdentityResolver>,
	rights: RightsEvaluator,
	tenders: TenderManager,
	bids: BidManager,
	directory: Directory,
}

impl TenderEngine {
	/// Wires all components to the given storage service.
	pub fn new(config: Config, storage: Arc<StorageService>) -> Self {
		let identity = Arc::new(IdentityResolver::new(storage.clone()));
		Self {
			rights: RightsEvaluator::new(storage.clone(), identity.clone()),
			tenders: TenderManager::new(storage.clone(), identity.clone()),
			bids: BidManager::new(storage.clone(), identity.clone()),
			directory: Directory::new(storage.clone()),
			identity,
			storage,
			config,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}

	pub fn identity(&self) -> &IdentityResolver {
		&self.identity
	}

	pub fn rights(&self) -> &RightsEvaluator {
		&self.rights
	}

	pub fn tenders(&self) -> &TenderManager {
		&self.tenders
	}

	pub fn bids(&self) -> &BidManager {
		&self.bids
	}

	pub fn directory(&self) -> &Directory {
		&self.directory
	}
}
