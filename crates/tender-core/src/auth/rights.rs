//! Authorization checks for organizations, tenders and bids.

use crate::auth::IdentityResolver;
use crate::CoreError;
use std::sync::Arc;
use tender_storage::{storage_key, StorageError, StorageService};
use tender_types::{Bid, StorageKey, Tender};

/// Decides whether an acting username may touch an entity.
///
/// `NotFound` means the user or the entity could not be resolved; `NoRights`
/// means both exist but the user has no authority.
pub struct RightsEvaluator {
	storage: Arc<StorageService>,
	identity: Arc<IdentityResolver>,
}

impl RightsEvaluator {
	pub fn new(storage: Arc<StorageService>, identity: Arc<IdentityResolver>) -> Self {
		Self { storage, identity }
	}

	/// Requires a responsibility relation between the user and the organization.
	pub async fn check_org_right(
		&self,
		username: &str,
		organization_id: &str,
	) -> Result<(), CoreError> {
		let user_id = self.identity.resolve_employee(username).await?;
		let relation = storage_key(organization_id, &user_id);
		if self
			.storage
			.exists(StorageKey::OrganizationResponsible.as_str(), &relation)
			.await?
		{
			Ok(())
		} else {
			Err(CoreError::NoRights(format!(
				"user '{}' is not responsible for organization '{}'",
				username, organization_id
			)))
		}
	}

	/// Checks rights over the organization that owns the tender.
	pub async fn check_tender_right(&self, username: &str, tender_id: &str) -> Result<(), CoreError> {
		let tender: Tender = self
			.storage
			.retrieve(StorageKey::Tenders.as_str(), tender_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => {
					CoreError::NotFound(format!("tender '{}' not found", tender_id))
				},
				other => other.into(),
			})?;
		self.check_org_right(username, &tender.organization_id).await
	}

	/// Requires the acting employee to be the bid's author.
	///
	/// Only the author id is compared, so a bid authored by an organization
	/// never passes this check.
	pub async fn check_bid_right(&self, username: &str, bid_id: &str) -> Result<(), CoreError> {
		let bid: Bid = self
			.storage
			.retrieve(StorageKey::Bids.as_str(), bid_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => CoreError::NotFound(format!("bid '{}' not found", bid_id)),
				other => other.into(),
			})?;
		let user_id = self.identity.resolve_employee(username).await?;
		if bid.author_id == user_id {
			Ok(())
		} else {
			Err(CoreError::NoRights(format!(
				"user '{}' is not the author of bid '{}'",
				username, bid_id
			)))
		}
	}
}
