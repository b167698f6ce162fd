//! Bid, bid version and feedback records.

use crate::status::{Status, UnknownVariant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Who submitted a bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorType {
	Organization,
	User,
}

impl AuthorType {
	/// Returns the stable string encoding of the author type.
	pub fn as_str(&self) -> &'static str {
		match self {
			AuthorType::Organization => "Organization",
			AuthorType::User => "User",
		}
	}
}

impl FromStr for AuthorType {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Organization" => Ok(Self::Organization),
			"User" => Ok(Self::User),
			_ => Err(UnknownVariant::new("author type", s)),
		}
	}
}

impl fmt::Display for AuthorType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A submission against a tender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
	pub id: String,
	pub name: String,
	pub description: String,
	pub status: Status,
	pub tender_id: String,
	pub author_type: AuthorType,
	/// Employee id or organization id, depending on `author_type`.
	pub author_id: String,
	pub version: u32,
	pub created_at: DateTime<Utc>,
}

/// Archived copy of a bid's editable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidVersion {
	pub bid_id: String,
	pub version: u32,
	pub name: String,
	pub description: String,
}

/// Review left on a bid by an evaluating employee. Never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
	pub id: String,
	pub bid_id: String,
	pub description: String,
	pub username: String,
	pub created_at: DateTime<Utc>,
}

/// Payload for `POST /api/bids/new`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBidDto {
	#[validate(length(max = 100))]
	pub name: String,
	#[validate(length(max = 500))]
	pub description: String,
	pub tender_id: String,
	pub author_type: AuthorType,
	pub author_id: String,
}

/// Payload for `PATCH /api/bids/{id}/edit`. Missing fields are blanked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PatchBidDto {
	#[validate(length(max = 100))]
	pub name: String,
	#[validate(length(max = 500))]
	pub description: String,
}

/// Feedback text as received from the requester.
#[derive(Debug, Clone, Validate)]
pub struct NewFeedback {
	#[validate(length(max = 1000))]
	pub description: String,
}
