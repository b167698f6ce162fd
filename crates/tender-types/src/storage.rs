//! Storage-related types for the tender service.

use std::str::FromStr;

/// Namespaces of the persisted collections.
///
/// Each variant plays the role of one table. Keys inside a namespace are
/// built by the owning component (plain ids, or `<entity>:<version>` for the
/// version ledgers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Employee records keyed by id
	Employees,
	/// Maps a username to an employee id
	EmployeeByUsername,
	/// Organization records keyed by id
	Organizations,
	/// Responsibility relations keyed by `<organization>:<user>`
	OrganizationResponsible,
	/// Live tender rows
	Tenders,
	/// Tender version ledger keyed by `<tender>:<version>`
	TenderVersions,
	/// Live bid rows
	Bids,
	/// Bid version ledger keyed by `<bid>:<version>`
	BidVersions,
	/// Feedback rows
	Feedback,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Employees => "employee",
			StorageKey::EmployeeByUsername => "employee_by_username",
			StorageKey::Organizations => "organization",
			StorageKey::OrganizationResponsible => "organization_responsible",
			StorageKey::Tenders => "tender",
			StorageKey::TenderVersions => "tender_version",
			StorageKey::Bids => "bid",
			StorageKey::BidVersions => "bid_version",
			StorageKey::Feedback => "feedback",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Employees,
			Self::EmployeeByUsername,
			Self::Organizations,
			Self::OrganizationResponsible,
			Self::Tenders,
			Self::TenderVersions,
			Self::Bids,
			Self::BidVersions,
			Self::Feedback,
		]
		.into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all().find(|key| key.as_str() == s).ok_or(())
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}
