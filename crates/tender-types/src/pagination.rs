//! Limit/offset pagination applied to an already fetched result set.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
	#[error("{field} must not be negative, got {value}")]
	Negative { field: &'static str, value: i64 },
}

/// Window over a result list.
///
/// The offset is applied first and only when it falls strictly inside the
/// list; an offset at or past the end leaves the list untouched. The limit
/// then truncates whatever remains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
	pub limit: Option<usize>,
	pub offset: usize,
}

impl Pagination {
	/// Builds a window from raw request values, rejecting negatives.
	pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, PaginationError> {
		let limit = match limit {
			Some(value) if value < 0 => {
				return Err(PaginationError::Negative {
					field: "limit",
					value,
				})
			},
			Some(value) => Some(value as usize),
			None => None,
		};
		let offset = match offset {
			Some(value) if value < 0 => {
				return Err(PaginationError::Negative {
					field: "offset",
					value,
				})
			},
			Some(value) => value as usize,
			None => 0,
		};
		Ok(Self { limit, offset })
	}

	pub fn apply<T>(&self, mut items: Vec<T>) -> Vec<T> {
		if self.offset > 0 && self.offset < items.len() {
			items.drain(..self.offset);
		}
		if let Some(limit) = self.limit {
			if limit < items.len() {
				items.truncate(limit);
			}
		}
		items
	}
}
