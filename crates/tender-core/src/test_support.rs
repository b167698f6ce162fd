//! Shared fixtures for the engine unit tests.

use crate::TenderEngine;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tender_config::Config;
use tender_storage::implementations::file::FileStorage;
use tender_storage::implementations::memory::MemoryStorage;
use tender_storage::{StorageError, StorageInterface, StorageService, WriteOp};
use tender_types::{
	AuthorType, Bid, ConfigSchema, CreateBidDto, CreateTenderDto, NewEmployee, NewOrganization,
	ServiceType, Tender,
};

/// Engine over memory storage with alice responsible for `org`, and bob and
/// carol as plain employees.
pub(crate) struct Fixture {
	pub engine: TenderEngine,
	pub alice: String,
	pub bob: String,
	pub carol: String,
	pub org: String,
}

pub(crate) fn test_config() -> Config {
	r#"
[service]
id = "core-test"

[storage]
primary = "memory"

[storage.implementations.memory]
"#
	.parse()
	.unwrap()
}

pub(crate) fn memory_storage() -> Arc<StorageService> {
	Arc::new(StorageService::new(Box::new(MemoryStorage::new())))
}

async fn populate(engine: TenderEngine) -> Fixture {
	let directory = engine.directory();
	let mut ids = Vec::new();
	for username in ["alice", "bob", "carol"] {
		let employee = directory
			.register_employee(NewEmployee {
				username: username.into(),
				..Default::default()
			})
			.await
			.unwrap();
		ids.push(employee.id);
	}
	let org = directory
		.register_organization(NewOrganization {
			name: "Acme".into(),
			..Default::default()
		})
		.await
		.unwrap();
	directory.assign_responsible(&org.id, &ids[0]).await.unwrap();

	let carol = ids.pop().unwrap();
	let bob = ids.pop().unwrap();
	let alice = ids.pop().unwrap();
	Fixture {
		engine,
		alice,
		bob,
		carol,
		org: org.id,
	}
}

pub(crate) async fn engine_with_directory() -> Fixture {
	populate(TenderEngine::new(test_config(), memory_storage())).await
}

/// Fixture over file storage rooted at `base`.
pub(crate) async fn file_engine(base: &std::path::Path) -> Fixture {
	let storage = Arc::new(StorageService::new(Box::new(FileStorage::new(
		base.to_path_buf(),
	))));
	populate(TenderEngine::new(test_config(), storage)).await
}

pub(crate) fn tender_dto(fixture: &Fixture, name: &str) -> CreateTenderDto {
	CreateTenderDto {
		name: name.into(),
		description: format!("{} works", name),
		service_type: ServiceType::Construction,
		organization_id: fixture.org.clone(),
		creator_username: "alice".into(),
	}
}

pub(crate) async fn create_tender_with(
	fixture: &Fixture,
	name: &str,
	service_type: ServiceType,
) -> Tender {
	let dto = CreateTenderDto {
		service_type,
		..tender_dto(fixture, name)
	};
	fixture.engine.tenders().create(dto).await.unwrap()
}

pub(crate) async fn create_tender(fixture: &Fixture, name: &str) -> Tender {
	create_tender_with(fixture, name, ServiceType::Construction).await
}

pub(crate) async fn user_bid(fixture: &Fixture, tender_id: &str, author_id: &str) -> Bid {
	fixture
		.engine
		.bids()
		.create(CreateBidDto {
			name: "Offer".into(),
			description: "Fair price".into(),
			tender_id: tender_id.into(),
			author_type: AuthorType::User,
			author_id: author_id.into(),
		})
		.await
		.unwrap()
}

/// Memory backend whose batch commits can be made to fail.
struct FailingCommit {
	inner: MemoryStorage,
	fail: Arc<AtomicBool>,
}

#[async_trait]
impl StorageInterface for FailingCommit {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		self.inner.get_bytes(key).await
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		self.inner.set_bytes(key, value).await
	}

	async fn insert_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		self.inner.insert_bytes(key, value).await
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		self.inner.exists(key).await
	}

	async fn list_bytes(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StorageError> {
		self.inner.list_bytes(prefix).await
	}

	async fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StorageError> {
		if self.fail.load(Ordering::SeqCst) {
			return Err(StorageError::Backend("injected commit failure".into()));
		}
		self.inner.commit(ops).await
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		self.inner.config_schema()
	}
}

/// Fixture whose storage fails every batch commit while the flag is set.
pub(crate) async fn failing_engine() -> (Fixture, Arc<AtomicBool>) {
	let fail = Arc::new(AtomicBool::new(false));
	let backend = FailingCommit {
		inner: MemoryStorage::new(),
		fail: fail.clone(),
	};
	let storage = Arc::new(StorageService::new(Box::new(backend)));
	(populate(TenderEngine::new(test_config(), storage)).await, fail)
}
