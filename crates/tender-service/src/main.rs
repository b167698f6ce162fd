//! Main entry point for the tender service.
//!
//! This binary loads the configuration, builds the tender engine on the
//! configured storage backend, seeds the employee directory and serves the
//! HTTP API until interrupted.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tender_config::Config;
use tender_core::{EngineBuilder, TenderEngine};

mod apis;
mod server;

use tender_storage::implementations::file::create_storage as create_file_storage;
use tender_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the tender service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the tender service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the engine and seeds the directory
/// 5. Serves the API until Ctrl+C
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started tender service");

	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Invalid config path: {}", args.config.display()))?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let api_config = config.api.clone();
	let engine = Arc::new(build_engine(config).await?);

	server::start_server(api_config, engine).await?;

	tracing::info!("Stopped tender service");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

/// Builds the tender engine with the available storage backends.
async fn build_engine(config: Config) -> Result<TenderEngine, Box<dyn std::error::Error>> {
	let storage_factories = create_factory_map!(
		tender_storage::StorageInterface,
		tender_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	Ok(EngineBuilder::new(config).build(storage_factories).await?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[tokio::test]
	async fn test_build_engine_from_file_config() {
		let dir = tempdir().unwrap();
		let storage_path = dir.path().join("storage");
		let config_path = dir.path().join("config.toml");
		std::fs::write(
			&config_path,
			format!(
				r#"
[service]
id = "file-test"

[storage]
primary = "file"

[storage.implementations.file]
storage_path = "{}"

[[directory.employees]]
username = "alice"

[[directory.organizations]]
id = "acme"
name = "Acme"
responsible = ["alice"]
"#,
				storage_path.display()
			),
		)
		.unwrap();

		let config = Config::from_file(config_path.to_str().unwrap())
			.await
			.unwrap();
		let engine = build_engine(config.clone()).await.unwrap();
		engine.rights().check_org_right("alice", "acme").await.unwrap();
		assert!(storage_path.join("employee").exists());

		// A restart over the same files finds the seeded records in place.
		let engine = build_engine(config).await.unwrap();
		engine.rights().check_org_right("alice", "acme").await.unwrap();
	}

	#[tokio::test]
	async fn test_build_engine_rejects_unknown_backend() {
		let config: Config = r#"
[service]
id = "test"

[storage]
primary = "redis"

[storage.implementations.redis]
"#
		.parse()
		.unwrap();
		assert!(build_engine(config).await.is_err());
	}
}
