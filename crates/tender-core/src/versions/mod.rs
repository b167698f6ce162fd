//! Append-only version ledger for tenders and bids.
//!
//! Before an entity's editable fields change, its current state is archived
//! under `<entityId>:<version>`. The archive write is staged as a create-only
//! insert in the same [`Batch`] as the live update, so a lost race on the same
//! entity fails the whole batch instead of overwriting an archived version.

use crate::CoreError;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use tender_storage::{Batch, StorageError, StorageService};
use tender_types::{Bid, BidVersion, StorageKey, Tender, TenderVersion};

/// An entity with a live row and a ledger of archived editable fields.
pub trait Versioned: Serialize + DeserializeOwned + Send + Sync {
	/// Archived copy of the editable fields.
	type Snapshot: Serialize + DeserializeOwned + Send + Sync;

	/// Namespace of the live rows.
	const LIVE: StorageKey;
	/// Namespace of the ledger rows.
	const LEDGER: StorageKey;
	/// Entity name used in error messages.
	const KIND: &'static str;

	fn id(&self) -> &str;
	fn version(&self) -> u32;
	fn set_version(&mut self, version: u32);

	/// Copies the editable fields tagged with the current version.
	fn snapshot(&self) -> Self::Snapshot;

	/// Overwrites the editable fields from an archived copy.
	fn restore(&mut self, snapshot: Self::Snapshot);

	/// Version an archived copy was taken at.
	fn snapshot_version(snapshot: &Self::Snapshot) -> u32;
}

impl Versioned for Tender {
	type Snapshot = TenderVersion;

	const LIVE: StorageKey = StorageKey::Tenders;
	const LEDGER: StorageKey = StorageKey::TenderVersions;
	const KIND: &'static str = "tender";

	fn id(&self) -> &str {
		&self.id
	}

	fn version(&self) -> u32 {
		self.version
	}

	fn set_version(&mut self, version: u32) {
		self.version = version;
	}

	fn snapshot(&self) -> TenderVersion {
		TenderVersion {
			tender_id: self.id.clone(),
			version: self.version,
			name: self.name.clone(),
			description: self.description.clone(),
			service_type: self.service_type,
		}
	}

	fn restore(&mut self, snapshot: TenderVersion) {
		self.name = snapshot.name;
		self.description = snapshot.description;
		self.service_type = snapshot.service_type;
	}

	fn snapshot_version(snapshot: &TenderVersion) -> u32 {
		snapshot.version
	}
}

impl Versioned for Bid {
	type Snapshot = BidVersion;

	const LIVE: StorageKey = StorageKey::Bids;
	const LEDGER: StorageKey = StorageKey::BidVersions;
	const KIND: &'static str = "bid";

	fn id(&self) -> &str {
		&self.id
	}

	fn version(&self) -> u32 {
		self.version
	}

	fn set_version(&mut self, version: u32) {
		self.version = version;
	}

	fn snapshot(&self) -> BidVersion {
		BidVersion {
			bid_id: self.id.clone(),
			version: self.version,
			name: self.name.clone(),
			description: self.description.clone(),
		}
	}

	fn restore(&mut self, snapshot: BidVersion) {
		self.name = snapshot.name;
		self.description = snapshot.description;
	}

	fn snapshot_version(snapshot: &BidVersion) -> u32 {
		snapshot.version
	}
}

/// Ledger key of one archived version.
fn ledger_id(entity_id: &str, version: u32) -> String {
	format!("{}:{}", entity_id, version)
}

/// Reads and stages ledger rows for one entity kind.
pub struct VersionStore<T> {
	storage: Arc<StorageService>,
	_kind: PhantomData<fn() -> T>,
}

impl<T: Versioned> VersionStore<T> {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			_kind: PhantomData,
		}
	}

	/// Loads the live row of an entity.
	pub async fn load(&self, entity_id: &str) -> Result<T, CoreError> {
		self.storage
			.retrieve(T::LIVE.as_str(), entity_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => {
					CoreError::NotFound(format!("{} '{}' not found", T::KIND, entity_id))
				},
				other => other.into(),
			})
	}

	/// Stages the archive of `entity` at its current version.
	///
	/// Returns the archived version number.
	pub fn snapshot(&self, entity: &T, batch: &mut Batch) -> Result<u32, CoreError> {
		let version = entity.version();
		batch.insert(
			T::LEDGER.as_str(),
			&ledger_id(entity.id(), version),
			&entity.snapshot(),
		)?;
		Ok(version)
	}

	/// Loads the live entity and stages its archive.
	///
	/// Returns the loaded entity together with the archived version number.
	pub async fn snapshot_current(
		&self,
		entity_id: &str,
		batch: &mut Batch,
	) -> Result<(T, u32), CoreError> {
		let entity = self.load(entity_id).await?;
		let version = self.snapshot(&entity, batch)?;
		Ok((entity, version))
	}

	/// Stages `entity` as the live row at `archived + 1` and commits the batch.
	pub async fn commit_next(
		&self,
		mut entity: T,
		archived: u32,
		mut batch: Batch,
	) -> Result<T, CoreError> {
		let next = archived.checked_add(1).ok_or_else(|| {
			CoreError::Internal(format!(
				"{} '{}' has exhausted its version counter",
				T::KIND,
				entity.id()
			))
		})?;
		entity.set_version(next);
		batch.put(T::LIVE.as_str(), entity.id(), &entity)?;
		self.storage.commit(batch).await?;
		Ok(entity)
	}

	/// Reads the archived fields of exactly `version`.
	///
	/// Versions that were never archived, including zero, negative and
	/// out-of-range numbers, all fail with the same `NotFound`.
	pub async fn restore_from(&self, entity_id: &str, version: i64) -> Result<T::Snapshot, CoreError> {
		let not_found = || {
			CoreError::NotFound(format!(
				"version {} of {} '{}' not found",
				version,
				T::KIND,
				entity_id
			))
		};

		let version = u32::try_from(version).map_err(|_| not_found())?;
		self.storage
			.retrieve(T::LEDGER.as_str(), &ledger_id(entity_id, version))
			.await
			.map_err(|e| match e {
				StorageError::NotFound => not_found(),
				other => other.into(),
			})
	}

	/// Lists every archived version of an entity, oldest first.
	pub async fn history(&self, entity_id: &str) -> Result<Vec<T::Snapshot>, CoreError> {
		let mut snapshots: Vec<T::Snapshot> = self
			.storage
			.list_prefixed(T::LEDGER.as_str(), &format!("{}:", entity_id))
			.await?;
		snapshots.sort_by_key(T::snapshot_version);
		Ok(snapshots)
	}
}
