//! Builder for constructing tender engines.
//!
//! Selects the primary storage implementation from configuration, wraps it in
//! a [`StorageService`] and seeds the employee directory before the engine is
//! handed to the HTTP layer.

use crate::TenderEngine;
use std::collections::HashMap;
use std::sync::Arc;
use tender_config::Config;
use tender_storage::{StorageError, StorageInterface, StorageService};
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Directory seeding failed: {0}")]
	Seed(String),
}

/// Builder for constructing a TenderEngine with a pluggable storage backend.
pub struct EngineBuilder {
	config: Config,
}

impl EngineBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the engine using the storage factory named as primary.
	///
	/// Every configured implementation with a known factory is created, so a
	/// broken secondary configuration is reported at startup too.
	pub async fn build<SF>(self, storage_factories: HashMap<String, SF>) -> Result<TenderEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			let Some(factory) = storage_factories.get(name) else {
				tracing::warn!(component = "storage", implementation = %name, "Unknown storage implementation");
				continue;
			};
			match factory(config) {
				Ok(implementation) => {
					if let Err(e) = implementation.config_schema().validate(config) {
						tracing::error!(
							component = "storage",
							implementation = %name,
							error = %e,
							"Invalid configuration for storage implementation"
						);
						return Err(BuilderError::Config(format!(
							"Invalid configuration for storage implementation '{}': {}",
							name, e
						)));
					}
					let is_primary = &self.config.storage.primary == name;
					tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
					storage_impls.insert(name.clone(), implementation);
				},
				Err(e) => {
					tracing::error!(
						component = "storage",
						implementation = %name,
						error = %e,
						"Failed to create storage implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create storage implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;

		let storage = Arc::new(StorageService::new(storage_backend));
		let engine = TenderEngine::new(self.config, storage);

		engine
			.directory()
			.seed(&engine.config().directory)
			.await
			.map_err(|e| BuilderError::Seed(e.to_string()))?;

		tracing::info!(service_id = %engine.config().service.id, "Engine ready");
		Ok(engine)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tender_storage::implementations::memory::MemoryStorage;
	use tender_storage::{get_all_implementations, StorageFactory};

	fn factories() -> HashMap<String, StorageFactory> {
		get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect()
	}

	#[tokio::test]
	async fn test_build_seeds_directory() {
		let config: Config = r#"
[service]
id = "builder-test"

[storage]
primary = "memory"

[storage.implementations.memory]

[[directory.employees]]
username = "alice"

[[directory.organizations]]
id = "acme"
name = "Acme"
responsible = ["alice"]
"#
		.parse()
		.unwrap();

		let engine = EngineBuilder::new(config).build(factories()).await.unwrap();
		engine.rights().check_org_right("alice", "acme").await.unwrap();
	}

	#[tokio::test]
	async fn test_unknown_primary_is_rejected() {
		let config: Config = r#"
[service]
id = "builder-test"

[storage]
primary = "postgres"

[storage.implementations.postgres]
url = "postgres://localhost"
"#
		.parse()
		.unwrap();

		let result = EngineBuilder::new(config).build(factories()).await;
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}

	#[tokio::test]
	async fn test_invalid_backend_config_is_rejected() {
		let config: Config = r#"
[service]
id = "builder-test"

[storage]
primary = "memory"

[storage.implementations.memory]
unexpected = true
"#
		.parse()
		.unwrap();

		let result = EngineBuilder::new(config).build(factories()).await;
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}

	// Factories may skip validation; the implementation's schema is checked
	// again before the backend is accepted.
	#[tokio::test]
	async fn test_schema_is_checked_after_factory() {
		let config: Config = r#"
[service]
id = "builder-test"

[storage]
primary = "memory"

[storage.implementations.memory]
unexpected = true
"#
		.parse()
		.unwrap();

		fn lenient(_: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
			Ok(Box::new(MemoryStorage::new()))
		}
		let mut factories: HashMap<String, StorageFactory> = HashMap::new();
		factories.insert("memory".into(), lenient);

		let result = EngineBuilder::new(config).build(factories).await;
		assert!(matches!(result, Err(BuilderError::Config(msg)) if msg.contains("Invalid configuration")));
	}
}
