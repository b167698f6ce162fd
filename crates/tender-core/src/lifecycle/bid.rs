//! Bid lifecycle plus the feedback attached to bids.

use crate::auth::IdentityResolver;
use crate::clock::creation_time;
use crate::versions::{VersionStore, Versioned};
use crate::CoreError;
use std::collections::HashSet;
use std::sync::Arc;
use tender_storage::{Batch, StorageService};
use tender_types::{
	Bid, CreateBidDto, Feedback, NewFeedback, PatchBidDto, Status, StorageKey,
};
use tracing::instrument;
use validator::Validate;

/// Manages bids, their version ledger and reviewer feedback.
pub struct BidManager {
	storage: Arc<StorageService>,
	versions: VersionStore<Bid>,
	identity: Arc<IdentityResolver>,
}

impl BidManager {
	pub fn new(storage: Arc<StorageService>, identity: Arc<IdentityResolver>) -> Self {
		Self {
			versions: VersionStore::new(storage.clone()),
			storage,
			identity,
		}
	}

	/// Access to the bid ledger.
	pub fn versions(&self) -> &VersionStore<Bid> {
		&self.versions
	}

	/// Creates a bid at version 1 with status `Created`.
	///
	/// The author is checked by the caller; the tender is checked here.
	#[instrument(skip_all, fields(tender_id = %dto.tender_id))]
	pub async fn create(&self, dto: CreateBidDto) -> Result<Bid, CoreError> {
		dto.validate()?;
		self.check_tender_exists(&dto.tender_id).await?;

		let bid = Bid {
			id: uuid::Uuid::new_v4().to_string(),
			name: dto.name,
			description: dto.description,
			status: Status::Created,
			tender_id: dto.tender_id,
			author_type: dto.author_type,
			author_id: dto.author_id,
			version: 1,
			created_at: creation_time(),
		};

		self.storage
			.insert(StorageKey::Bids.as_str(), &bid.id, &bid)
			.await?;

		tracing::info!(bid_id = %bid.id, author_type = %bid.author_type, "Bid created");
		Ok(bid)
	}

	pub async fn check_tender_exists(&self, tender_id: &str) -> Result<(), CoreError> {
		if self
			.storage
			.exists(StorageKey::Tenders.as_str(), tender_id)
			.await?
		{
			Ok(())
		} else {
			Err(CoreError::NotFound(format!("tender '{}' not found", tender_id)))
		}
	}

	pub async fn get(&self, bid_id: &str) -> Result<Bid, CoreError> {
		self.versions.load(bid_id).await
	}

	async fn list_where(&self, keep: impl Fn(&Bid) -> bool) -> Result<Vec<Bid>, CoreError> {
		let mut bids: Vec<Bid> = self.storage.list(StorageKey::Bids.as_str()).await?;
		bids.retain(|b| keep(b));
		bids.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
		Ok(bids)
	}

	/// Lists the bids whose author is the employee behind `username`.
	pub async fn get_my(&self, username: &str) -> Result<Vec<Bid>, CoreError> {
		let user_id = self.identity.resolve_employee(username).await?;
		self.list_where(|b| b.author_id == user_id).await
	}

	/// Lists every bid placed on a tender.
	pub async fn get_for_tender(&self, tender_id: &str) -> Result<Vec<Bid>, CoreError> {
		self.list_where(|b| b.tender_id == tender_id).await
	}

	pub async fn get_status(&self, bid_id: &str) -> Result<Status, CoreError> {
		Ok(self.get(bid_id).await?.status)
	}

	/// Overwrites the status without transition checks or a version bump.
	#[instrument(skip_all, fields(bid_id = %bid_id, status = %status))]
	pub async fn change_status(&self, bid_id: &str, status: Status) -> Result<Bid, CoreError> {
		let mut bid = self.get(bid_id).await?;
		bid.status = status;
		self.storage
			.update(StorageKey::Bids.as_str(), bid_id, &bid)
			.await?;

		tracing::info!("Bid status changed");
		Ok(bid)
	}

	/// Archives the current version and writes the patch as the next one.
	/// Omitted fields are written empty.
	#[instrument(skip_all, fields(bid_id = %bid_id))]
	pub async fn patch(&self, bid_id: &str, dto: PatchBidDto) -> Result<Bid, CoreError> {
		dto.validate()?;

		let mut batch = Batch::new();
		let (mut bid, archived) = self.versions.snapshot_current(bid_id, &mut batch).await?;
		bid.name = dto.name;
		bid.description = dto.description;

		let bid = self.versions.commit_next(bid, archived, batch).await?;
		tracing::info!(archived, version = bid.version, "Bid patched");
		Ok(bid)
	}

	#[instrument(skip_all, fields(bid_id = %bid_id, target_version = target))]
	pub async fn rollback_version(&self, bid_id: &str, target: i64) -> Result<Bid, CoreError> {
		let restored = self.versions.restore_from(bid_id, target).await?;

		let mut batch = Batch::new();
		let (mut bid, archived) = self.versions.snapshot_current(bid_id, &mut batch).await?;
		bid.restore(restored);

		let bid = self.versions.commit_next(bid, archived, batch).await?;
		tracing::info!(archived, version = bid.version, "Bid rolled back");
		Ok(bid)
	}

	/// Appends a review to a bid.
	///
	/// Both the reviewing employee and the bid must exist. The same reviewer
	/// may review a bid any number of times.
	#[instrument(skip_all, fields(bid_id = %bid_id, username = %username))]
	pub async fn create_feedback(
		&self,
		bid_id: &str,
		username: &str,
		description: &str,
	) -> Result<Feedback, CoreError> {
		NewFeedback {
			description: description.to_string(),
		}
		.validate()?;

		self.identity.resolve_employee(username).await?;
		self.get(bid_id).await?;

		let feedback = Feedback {
			id: uuid::Uuid::new_v4().to_string(),
			bid_id: bid_id.to_string(),
			description: description.to_string(),
			username: username.to_string(),
			created_at: creation_time(),
		};
		self.storage
			.insert(StorageKey::Feedback.as_str(), &feedback.id, &feedback)
			.await?;

		tracing::info!(feedback_id = %feedback.id, "Feedback recorded");
		Ok(feedback)
	}

	/// Collects all feedback left on any bid authored by `author_username`.
	pub async fn get_all_user_reviews(&self, author_username: &str) -> Result<Vec<Feedback>, CoreError> {
		let author_id = self.identity.resolve_employee(author_username).await?;
		let bid_ids: HashSet<String> = self
			.list_where(|b| b.author_id == author_id)
			.await?
			.into_iter()
			.map(|b| b.id)
			.collect();

		let mut reviews: Vec<Feedback> = self.storage.list(StorageKey::Feedback.as_str()).await?;
		reviews.retain(|f| bid_ids.contains(&f.bid_id));
		reviews.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
		Ok(reviews)
	}

	/// Succeeds only if the employee behind `username` has bid on the tender.
	pub async fn check_if_user_bid_exists(&self, tender_id: &str, username: &str) -> Result<(), CoreError> {
		let user_id = self.identity.resolve_employee(username).await?;
		let found = self
			.list_where(|b| b.tender_id == tender_id && b.author_id == user_id)
			.await?;
		if found.is_empty() {
			Err(CoreError::NotFound(format!(
				"tender '{}' has no bid by '{}'",
				tender_id, username
			)))
		} else {
			Ok(())
		}
	}
}
