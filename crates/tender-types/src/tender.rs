//! Tender records and request payloads.

use crate::status::{Status, UnknownVariant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Kind of service a tender asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ServiceType {
	/// Also the value written when a patch omits the field.
	#[default]
	Construction,
	Delivery,
	Manufacture,
}

impl ServiceType {
	/// Returns the stable string encoding of the service type.
	pub fn as_str(&self) -> &'static str {
		match self {
			ServiceType::Construction => "Construction",
			ServiceType::Delivery => "Delivery",
			ServiceType::Manufacture => "Manufacture",
		}
	}
}

impl FromStr for ServiceType {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Construction" => Ok(Self::Construction),
			"Delivery" => Ok(Self::Delivery),
			"Manufacture" => Ok(Self::Manufacture),
			_ => Err(UnknownVariant::new("service type", s)),
		}
	}
}

impl fmt::Display for ServiceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A request for services posted by an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
	pub id: String,
	pub name: String,
	pub description: String,
	pub service_type: ServiceType,
	pub status: Status,
	pub organization_id: String,
	pub creator_username: String,
	/// Starts at 1 and grows on every patch or rollback.
	pub version: u32,
	pub created_at: DateTime<Utc>,
}

/// Archived copy of a tender's editable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderVersion {
	pub tender_id: String,
	/// The version the tender carried when this copy was taken.
	pub version: u32,
	pub name: String,
	pub description: String,
	pub service_type: ServiceType,
}

/// Payload for `POST /api/tenders/new`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenderDto {
	#[validate(length(max = 100))]
	pub name: String,
	#[validate(length(max = 500))]
	pub description: String,
	pub service_type: ServiceType,
	#[validate(length(max = 100))]
	pub organization_id: String,
	pub creator_username: String,
}

/// Payload for `PATCH /api/tenders/{id}/edit`.
///
/// Every field is written as given. A missing field becomes an empty string
/// (or `Construction`), it is not merged with the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PatchTenderDto {
	#[validate(length(max = 100))]
	pub name: String,
	#[validate(length(max = 500))]
	pub description: String,
	pub service_type: ServiceType,
}
