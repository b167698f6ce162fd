//! File-based storage backend for the tender service.
//!
//! Every namespace gets its own directory under the configured base path and
//! every record is one JSON file inside it, so a prefix scan is a directory
//! listing.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry, WriteOp};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tender_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use tokio::fs;
use tokio::sync::Mutex;

const EXTENSION: &str = "json";

/// File-based storage implementation.
///
/// Writes go to a uniquely named temporary file that is then renamed over the
/// target, so a single record is never observed half-written. All writers
/// take `write_lock`, which makes the create-only checks of a batch and its
/// writes one step. A crash midway through a batch can leave the earlier
/// files of the batch on disk.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
	write_lock: Mutex<()>,
}

impl FileStorage {
	/// Creates a new FileStorage instance rooted at `base_path`.
	pub fn new(base_path: PathBuf) -> Self {
		Self {
			base_path,
			write_lock: Mutex::new(()),
		}
	}

	/// Makes an id safe to use as a file name.
	///
	/// Path separators, `:` and the escape character itself are
	/// percent-encoded, so distinct ids never share a file.
	fn sanitize(id: &str) -> String {
		let mut encoded = String::with_capacity(id.len());
		for c in id.chars() {
			match c {
				'%' => encoded.push_str("%25"),
				'/' => encoded.push_str("%2F"),
				'\\' => encoded.push_str("%5C"),
				':' => encoded.push_str("%3A"),
				_ => encoded.push(c),
			}
		}
		encoded
	}

	/// Splits `namespace:id` into the namespace directory and the rest.
	fn split_key(key: &str) -> (&str, &str) {
		key.split_once(':').unwrap_or(("", key))
	}

	/// Converts a storage key to its file path.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let (namespace, id) = Self::split_key(key);
		self.base_path
			.join(Self::sanitize(namespace))
			.join(format!("{}.{}", Self::sanitize(id), EXTENSION))
	}

	async fn write_file(path: &Path, value: &[u8]) -> Result<(), StorageError> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4()));
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		if let Err(e) = fs::rename(&temp_path, path).await {
			let _ = fs::remove_file(&temp_path).await;
			return Err(StorageError::Backend(e.to_string()));
		}
		Ok(())
	}

	async fn path_exists(path: &Path) -> Result<bool, StorageError> {
		fs::try_exists(path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);
		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let _guard = self.write_lock.lock().await;
		Self::write_file(&self.get_file_path(key), &value).await
	}

	async fn insert_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);
		let _guard = self.write_lock.lock().await;
		if Self::path_exists(&path).await? {
			return Err(StorageError::AlreadyExists(key.to_string()));
		}
		Self::write_file(&path, &value).await
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Self::path_exists(&self.get_file_path(key)).await
	}

	async fn list_bytes(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StorageError> {
		let (namespace, id_prefix) = Self::split_key(prefix);
		let dir = self.base_path.join(Self::sanitize(namespace));
		let file_prefix = Self::sanitize(id_prefix);

		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut paths = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new(EXTENSION)) {
				continue;
			}
			let matches = path
				.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(|name| name.starts_with(&file_prefix));
			if matches {
				paths.push(path);
			}
		}
		paths.sort();

		let mut values = Vec::with_capacity(paths.len());
		for path in paths {
			match fs::read(&path).await {
				Ok(data) => values.push(data),
				Err(e) => {
					tracing::debug!("Skipping file {:?}: could not be read: {}", path, e);
				},
			}
		}
		Ok(values)
	}

	async fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StorageError> {
		let _guard = self.write_lock.lock().await;
		for op in &ops {
			if let WriteOp::Insert { key, .. } = op {
				if Self::path_exists(&self.get_file_path(key)).await? {
					return Err(StorageError::AlreadyExists(key.clone()));
				}
			}
		}

		for op in ops {
			match op {
				WriteOp::Insert { key, value } | WriteOp::Put { key, value } => {
					Self::write_file(&self.get_file_path(&key), &value).await?;
				},
			}
		}
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("storage_path", FieldType::String)],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage")
		.to_string();

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[tokio::test]
	async fn test_get_missing_key() {
		let dir = tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());
		assert!(matches!(
			storage.get_bytes("tender:nope").await,
			Err(StorageError::NotFound)
		));
		assert!(!storage.exists("tender:nope").await.unwrap());
	}

	#[tokio::test]
	async fn test_namespace_becomes_directory() {
		let dir = tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage
			.set_bytes("tender_version:abc:1", b"{}".to_vec())
			.await
			.unwrap();
		assert!(dir
			.path()
			.join("tender_version")
			.join("abc%3A1.json")
			.exists());
		assert_eq!(
			storage.get_bytes("tender_version:abc:1").await.unwrap(),
			b"{}".to_vec()
		);
	}

	#[tokio::test]
	async fn test_list_does_not_cross_namespaces() {
		let dir = tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage.set_bytes("tender:a", b"1".to_vec()).await.unwrap();
		storage.set_bytes("tender:b", b"2".to_vec()).await.unwrap();
		storage
			.set_bytes("tender_version:a:1", b"3".to_vec())
			.await
			.unwrap();

		let live = storage.list_bytes("tender:").await.unwrap();
		assert_eq!(live, vec![b"1".to_vec(), b"2".to_vec()]);

		let ledger = storage.list_bytes("tender_version:a:").await.unwrap();
		assert_eq!(ledger, vec![b"3".to_vec()]);

		assert!(storage.list_bytes("bid:").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_insert_and_commit_conflicts() {
		let dir = tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage.insert_bytes("bid:1", b"a".to_vec()).await.unwrap();
		assert!(matches!(
			storage.insert_bytes("bid:1", b"b".to_vec()).await,
			Err(StorageError::AlreadyExists(_))
		));

		let result = storage
			.commit(vec![
				WriteOp::Put {
					key: "bid:2".into(),
					value: b"c".to_vec(),
				},
				WriteOp::Insert {
					key: "bid:1".into(),
					value: b"d".to_vec(),
				},
			])
			.await;
		assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
		assert!(!storage.exists("bid:2").await.unwrap());
		assert_eq!(storage.get_bytes("bid:1").await.unwrap(), b"a".to_vec());
	}

	#[tokio::test]
	async fn test_similar_ids_get_distinct_files() {
		let dir = tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		let keys = [
			"organization_responsible:a:b",
			"organization_responsible:a_b",
			"employee_by_username:x/y",
			"employee_by_username:x_y",
			"employee_by_username:x%2Fy",
		];
		for (i, key) in keys.iter().enumerate() {
			storage
				.insert_bytes(key, i.to_string().into_bytes())
				.await
				.unwrap();
		}
		for (i, key) in keys.iter().enumerate() {
			assert_eq!(
				storage.get_bytes(key).await.unwrap(),
				i.to_string().into_bytes()
			);
		}

		let relations = storage
			.list_bytes("organization_responsible:a:")
			.await
			.unwrap();
		assert_eq!(relations, vec![b"0".to_vec()]);
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_concurrent_overwrites_all_succeed() {
		let dir = tempdir().unwrap();
		let storage = std::sync::Arc::new(FileStorage::new(dir.path().to_path_buf()));

		let mut handles = Vec::new();
		for i in 0..64u32 {
			let storage = storage.clone();
			handles.push(tokio::spawn(async move {
				storage
					.set_bytes("tender:shared", i.to_string().into_bytes())
					.await
			}));
		}
		for handle in handles {
			handle.await.unwrap().unwrap();
		}

		let value = storage.get_bytes("tender:shared").await.unwrap();
		let value: u32 = String::from_utf8(value).unwrap().parse().unwrap();
		assert!(value < 64);
		assert_eq!(storage.list_bytes("tender:").await.unwrap().len(), 1);
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_racing_inserts_have_one_winner() {
		let dir = tempdir().unwrap();
		let storage = std::sync::Arc::new(FileStorage::new(dir.path().to_path_buf()));

		let mut handles = Vec::new();
		for i in 0..32u32 {
			let storage = storage.clone();
			handles.push(tokio::spawn(async move {
				storage
					.commit(vec![
						WriteOp::Insert {
							key: "tender_version:t:1".into(),
							value: i.to_string().into_bytes(),
						},
						WriteOp::Put {
							key: "tender:t".into(),
							value: i.to_string().into_bytes(),
						},
					])
					.await
			}));
		}

		let mut winners = Vec::new();
		for handle in handles {
			match handle.await.unwrap() {
				Ok(()) => winners.push(()),
				Err(e) => assert!(matches!(e, StorageError::AlreadyExists(_))),
			}
		}
		assert_eq!(winners.len(), 1);
		assert_eq!(
			storage.get_bytes("tender_version:t:1").await.unwrap(),
			storage.get_bytes("tender:t").await.unwrap()
		);
	}

	#[test]
	fn test_factory_validates_config() {
		let bad: toml::Value = toml::from_str("storage_path = 5").unwrap();
		assert!(matches!(
			create_storage(&bad),
			Err(StorageError::Configuration(_))
		));

		let good: toml::Value = toml::from_str("storage_path = \"/tmp/tenders\"").unwrap();
		assert!(create_storage(&good).is_ok());
	}
}
