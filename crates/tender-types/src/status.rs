//! Lifecycle status shared by tenders and bids.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
	/// Name of the enumeration that failed to parse.
	pub kind: &'static str,
	/// The rejected input.
	pub value: String,
}

impl UnknownVariant {
	pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
		Self {
			kind,
			value: value.into(),
		}
	}
}

/// Status of a tender or a bid.
///
/// Any status may be set from any other status; no transition table is
/// enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
	#[default]
	Created,
	Published,
	Closed,
	Canceled,
}

impl Status {
	/// Returns the stable string encoding of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			Status::Created => "Created",
			Status::Published => "Published",
			Status::Closed => "Closed",
			Status::Canceled => "Canceled",
		}
	}
}

impl FromStr for Status {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Created" => Ok(Self::Created),
			"Published" => Ok(Self::Published),
			"Closed" => Ok(Self::Closed),
			"Canceled" => Ok(Self::Canceled),
			_ => Err(UnknownVariant::new("status", s)),
		}
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
