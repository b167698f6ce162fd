//! Tender lifecycle: creation, status changes, edits and rollbacks.

use crate::auth::IdentityResolver;
use crate::clock::creation_time;
use crate::versions::{VersionStore, Versioned};
use crate::CoreError;
use std::sync::Arc;
use tender_storage::{Batch, StorageService};
use tender_types::{CreateTenderDto, PatchTenderDto, ServiceType, Status, StorageKey, Tender};
use tracing::instrument;
use validator::Validate;

/// Manages tender records and their version ledger.
///
/// Callers run the matching rights check before any mutating call.
pub struct TenderManager {
	storage: Arc<StorageService>,
	versions: VersionStore<Tender>,
	identity: Arc<IdentityResolver>,
}

impl TenderManager {
	pub fn new(storage: Arc<StorageService>, identity: Arc<IdentityResolver>) -> Self {
		Self {
			versions: VersionStore::new(storage.clone()),
			storage,
			identity,
		}
	}

	/// Access to the tender ledger.
	pub fn versions(&self) -> &VersionStore<Tender> {
		&self.versions
	}

	/// Creates a tender at version 1 with status `Created`.
	#[instrument(skip_all, fields(organization_id = %dto.organization_id))]
	pub async fn create(&self, dto: CreateTenderDto) -> Result<Tender, CoreError> {
		dto.validate()?;

		let tender = Tender {
			id: uuid::Uuid::new_v4().to_string(),
			name: dto.name,
			description: dto.description,
			service_type: dto.service_type,
			status: Status::Created,
			organization_id: dto.organization_id,
			creator_username: dto.creator_username,
			version: 1,
			created_at: creation_time(),
		};

		self.storage
			.insert(StorageKey::Tenders.as_str(), &tender.id, &tender)
			.await?;

		tracing::info!(tender_id = %tender.id, "Tender created");
		Ok(tender)
	}

	pub async fn get(&self, tender_id: &str) -> Result<Tender, CoreError> {
		self.versions.load(tender_id).await
	}

	/// Lists tenders in creation order.
	///
	/// An empty filter returns every tender; otherwise only tenders whose
	/// service type is listed.
	pub async fn get_all(&self, service_types: &[ServiceType]) -> Result<Vec<Tender>, CoreError> {
		let mut tenders: Vec<Tender> = self.storage.list(StorageKey::Tenders.as_str()).await?;
		if !service_types.is_empty() {
			tenders.retain(|t| service_types.contains(&t.service_type));
		}
		tenders.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
		Ok(tenders)
	}

	/// Lists the tenders created by `username`.
	///
	/// Fails with `NotFound` if the username is not an employee.
	pub async fn get_my(&self, username: &str) -> Result<Vec<Tender>, CoreError> {
		self.identity.resolve_employee(username).await?;
		let mut tenders: Vec<Tender> = self.storage.list(StorageKey::Tenders.as_str()).await?;
		tenders.retain(|t| t.creator_username == username);
		tenders.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
		Ok(tenders)
	}

	pub async fn get_status(&self, tender_id: &str) -> Result<Status, CoreError> {
		Ok(self.get(tender_id).await?.status)
	}

	/// Overwrites the status. Any transition is accepted and the version
	/// stays the same.
	#[instrument(skip_all, fields(tender_id = %tender_id, status = %status))]
	pub async fn change_status(&self, tender_id: &str, status: Status) -> Result<Tender, CoreError> {
		let mut tender = self.get(tender_id).await?;
		tender.status = status;
		self.storage
			.update(StorageKey::Tenders.as_str(), tender_id, &tender)
			.await?;

		tracing::info!("Tender status changed");
		Ok(tender)
	}

	/// Archives the current version and writes the patch as the next one.
	///
	/// Every field of the patch is written, so an omitted field ends up empty
	/// (or `Construction`).
	#[instrument(skip_all, fields(tender_id = %tender_id))]
	pub async fn patch(&self, tender_id: &str, dto: PatchTenderDto) -> Result<Tender, CoreError> {
		dto.validate()?;

		let mut batch = Batch::new();
		let (mut tender, archived) = self.versions.snapshot_current(tender_id, &mut batch).await?;
		tender.name = dto.name;
		tender.description = dto.description;
		tender.service_type = dto.service_type;

		let tender = self.versions.commit_next(tender, archived, batch).await?;
		tracing::info!(archived, version = tender.version, "Tender patched");
		Ok(tender)
	}

	/// Brings back the fields of `target` under a new version number.
	///
	/// The state being replaced is archived first, so it stays retrievable.
	#[instrument(skip_all, fields(tender_id = %tender_id, target_version = target))]
	pub async fn rollback_version(&self, tender_id: &str, target: i64) -> Result<Tender, CoreError> {
		let restored = self.versions.restore_from(tender_id, target).await?;

		let mut batch = Batch::new();
		let (mut tender, archived) = self.versions.snapshot_current(tender_id, &mut batch).await?;
		tender.restore(restored);

		let tender = self.versions.commit_next(tender, archived, batch).await?;
		tracing::info!(archived, version = tender.version, "Tender rolled back");
		Ok(tender)
	}
}

#[cfg(test)]
mod tests {
	use crate::test_support::{
		create_tender, create_tender_with, engine_with_directory, failing_engine, file_engine,
		tender_dto,
	};
	use crate::CoreError;
	use std::sync::atomic::Ordering;
	use std::sync::Arc;
	use tender_types::{PatchTenderDto, ServiceType, Status};

	#[tokio::test]
	async fn test_create_sets_initial_state() {
		let fixture = engine_with_directory().await;
		let tender = create_tender(&fixture, "Bridge").await;

		assert_eq!(tender.version, 1);
		assert_eq!(tender.status, Status::Created);
		assert_eq!(tender.organization_id, fixture.org);

		let stored = fixture.engine.tenders().get(&tender.id).await.unwrap();
		assert_eq!(stored, tender);
	}

	#[tokio::test]
	async fn test_create_rejects_long_name() {
		let fixture = engine_with_directory().await;
		let mut dto = tender_dto(&fixture, "x");
		dto.name = "n".repeat(101);
		assert!(matches!(
			fixture.engine.tenders().create(dto).await,
			Err(CoreError::Validation(_))
		));
	}

	#[tokio::test]
	async fn test_patch_then_rollback_restores_original_at_version_three() {
		let fixture = engine_with_directory().await;
		let tenders = fixture.engine.tenders();
		let tender = create_tender_with(&fixture, "Bridge", ServiceType::Delivery).await;

		let patched = tenders
			.patch(
				&tender.id,
				PatchTenderDto {
					name: "Tunnel".into(),
					description: tender.description.clone(),
					service_type: ServiceType::Delivery,
				},
			)
			.await
			.unwrap();
		assert_eq!(patched.name, "Tunnel");
		assert_eq!(patched.version, 2);

		let rolled = tenders.rollback_version(&tender.id, 1).await.unwrap();
		assert_eq!(rolled.name, "Bridge");
		assert_eq!(rolled.service_type, ServiceType::Delivery);
		assert_eq!(rolled.version, 3);

		// The patched state is archived under its own version.
		let archived = tenders.versions().restore_from(&tender.id, 2).await.unwrap();
		assert_eq!(archived.name, "Tunnel");
	}

	#[tokio::test]
	async fn test_rollback_to_unknown_version_changes_nothing() {
		let fixture = engine_with_directory().await;
		let tenders = fixture.engine.tenders();
		let tender = create_tender(&fixture, "Bridge").await;

		for target in [0, 1, 5, -3] {
			assert!(matches!(
				tenders.rollback_version(&tender.id, target).await,
				Err(CoreError::NotFound(_))
			));
		}
		assert_eq!(tenders.get(&tender.id).await.unwrap(), tender);
		assert!(tenders.versions().history(&tender.id).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_live_version_exceeds_every_archived_version() {
		let fixture = engine_with_directory().await;
		let tenders = fixture.engine.tenders();
		let tender = create_tender(&fixture, "Bridge").await;

		tenders
			.patch(&tender.id, PatchTenderDto { name: "A".into(), ..Default::default() })
			.await
			.unwrap();
		tenders
			.patch(&tender.id, PatchTenderDto { name: "B".into(), ..Default::default() })
			.await
			.unwrap();
		tenders.rollback_version(&tender.id, 2).await.unwrap();
		let live = tenders.rollback_version(&tender.id, 1).await.unwrap();

		let history = tenders.versions().history(&tender.id).await.unwrap();
		assert_eq!(history.len(), 4);
		assert!(history.iter().all(|v| v.version < live.version));
		assert_eq!(live.version, 5);
		assert_eq!(live.name, "Bridge");
	}

	// Patches are not merged: omitted fields are written blank.
	#[tokio::test]
	async fn test_patch_blanks_omitted_fields() {
		let fixture = engine_with_directory().await;
		let tender = create_tender_with(&fixture, "Bridge", ServiceType::Manufacture).await;

		let patch: PatchTenderDto = serde_json::from_str(r#"{"name":"Renamed"}"#).unwrap();
		let patched = fixture
			.engine
			.tenders()
			.patch(&tender.id, patch)
			.await
			.unwrap();

		assert_eq!(patched.name, "Renamed");
		assert_eq!(patched.description, "");
		assert_eq!(patched.service_type, ServiceType::Construction);
	}

	#[tokio::test]
	async fn test_patch_unknown_tender_is_not_found() {
		let fixture = engine_with_directory().await;
		assert!(matches!(
			fixture
				.engine
				.tenders()
				.patch("missing", PatchTenderDto::default())
				.await,
			Err(CoreError::NotFound(_))
		));
	}

	// There is no transition table: closed tenders can be reopened.
	#[tokio::test]
	async fn test_change_status_accepts_any_transition() {
		let fixture = engine_with_directory().await;
		let tenders = fixture.engine.tenders();
		let tender = create_tender(&fixture, "Bridge").await;

		for status in [Status::Closed, Status::Created, Status::Canceled, Status::Published] {
			let changed = tenders.change_status(&tender.id, status).await.unwrap();
			assert_eq!(changed.status, status);
			assert_eq!(changed.version, 1);
			assert_eq!(tenders.get_status(&tender.id).await.unwrap(), status);
		}
	}

	#[tokio::test]
	async fn test_get_all_filters_by_service_type_in_creation_order() {
		let fixture = engine_with_directory().await;
		let first = create_tender_with(&fixture, "one", ServiceType::Delivery).await;
		create_tender_with(&fixture, "two", ServiceType::Construction).await;
		let third = create_tender_with(&fixture, "three", ServiceType::Delivery).await;
		let fourth = create_tender_with(&fixture, "four", ServiceType::Manufacture).await;

		let tenders = fixture.engine.tenders();
		assert_eq!(tenders.get_all(&[]).await.unwrap().len(), 4);

		let delivery = tenders.get_all(&[ServiceType::Delivery]).await.unwrap();
		assert_eq!(
			delivery.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
			vec![first.id.as_str(), third.id.as_str()]
		);

		let mixed = tenders
			.get_all(&[ServiceType::Manufacture, ServiceType::Delivery])
			.await
			.unwrap();
		assert_eq!(mixed.len(), 3);
		assert_eq!(mixed[2].id, fourth.id);
	}

	#[tokio::test]
	async fn test_get_my_requires_known_employee() {
		let fixture = engine_with_directory().await;
		let tender = create_tender(&fixture, "Bridge").await;
		let tenders = fixture.engine.tenders();

		let mine = tenders.get_my("alice").await.unwrap();
		assert_eq!(mine, vec![tender]);
		assert!(tenders.get_my("bob").await.unwrap().is_empty());
		assert!(matches!(
			tenders.get_my("ghost").await,
			Err(CoreError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn test_failed_commit_leaves_live_row_and_ledger_untouched() {
		let (fixture, fail) = failing_engine().await;
		let tenders = fixture.engine.tenders();
		let tender = create_tender(&fixture, "Bridge").await;

		fail.store(true, Ordering::SeqCst);
		let result = tenders
			.patch(&tender.id, PatchTenderDto { name: "Lost".into(), ..Default::default() })
			.await;
		assert!(matches!(result, Err(CoreError::Internal(_))));
		fail.store(false, Ordering::SeqCst);

		assert_eq!(tenders.get(&tender.id).await.unwrap(), tender);
		assert!(tenders.versions().history(&tender.id).await.unwrap().is_empty());
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_concurrent_status_changes_on_file_storage() {
		let dir = tempfile::tempdir().unwrap();
		let fixture = Arc::new(file_engine(dir.path()).await);
		let tender = create_tender(&fixture, "Bridge").await;

		let mut handles = Vec::new();
		for _ in 0..64 {
			let fixture = fixture.clone();
			let id = tender.id.clone();
			handles.push(tokio::spawn(async move {
				fixture
					.engine
					.tenders()
					.change_status(&id, Status::Published)
					.await
			}));
		}
		for handle in handles {
			handle.await.unwrap().unwrap();
		}

		let tenders = fixture.engine.tenders();
		assert_eq!(
			tenders.get_status(&tender.id).await.unwrap(),
			Status::Published
		);
	}

	// Every acknowledged patch owns exactly one version bump; racing losers
	// fail instead of overwriting a winner.
	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_concurrent_patches_on_file_storage_are_never_lost() {
		let dir = tempfile::tempdir().unwrap();
		let fixture = Arc::new(file_engine(dir.path()).await);
		let tender = create_tender(&fixture, "Bridge").await;

		let mut handles = Vec::new();
		for i in 0..32 {
			let fixture = fixture.clone();
			let id = tender.id.clone();
			handles.push(tokio::spawn(async move {
				fixture
					.engine
					.tenders()
					.patch(
						&id,
						PatchTenderDto {
							name: format!("Bridge {}", i),
							..Default::default()
						},
					)
					.await
			}));
		}

		let mut succeeded = 0usize;
		for handle in handles {
			match handle.await.unwrap() {
				Ok(_) => succeeded += 1,
				Err(e) => assert!(matches!(e, CoreError::Internal(_)), "{}", e),
			}
		}

		let tenders = fixture.engine.tenders();
		let live = tenders.get(&tender.id).await.unwrap();
		let history = tenders.versions().history(&tender.id).await.unwrap();
		assert!(succeeded >= 1);
		assert_eq!(live.version as usize, succeeded + 1);
		assert_eq!(history.len(), succeeded);
	}
}
