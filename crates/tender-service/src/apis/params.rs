//! Query string access shared by the handlers.
//!
//! Parameters are kept as raw pairs so that repeated keys such as
//! `service_type` survive extraction.

use tender_types::{APIError, Pagination, ServiceType, Status};

pub struct QueryParams {
	pairs: Vec<(String, String)>,
}

impl QueryParams {
	pub fn new(pairs: Vec<(String, String)>) -> Self {
		Self { pairs }
	}

	/// First value of `name`, if present.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.pairs
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	/// First value of `name`, or an empty string when absent.
	pub fn get_or_empty(&self, name: &str) -> &str {
		self.get(name).unwrap_or_default()
	}

	/// Every value given for `name`, in request order.
	pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.pairs
			.iter()
			.filter(move |(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	fn integer(&self, name: &str) -> Result<Option<i64>, APIError> {
		match self.get(name) {
			None | Some("") => Ok(None),
			Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| {
				APIError::bad_request(format!("{} must be an integer, got '{}'", name, raw))
			}),
		}
	}

	/// Reads `limit` and `offset`; non-integer or negative values are rejected.
	pub fn pagination(&self) -> Result<Pagination, APIError> {
		Pagination::new(self.integer("limit")?, self.integer("offset")?)
			.map_err(|e| APIError::bad_request(e.to_string()))
	}

	/// Reads every `service_type` value; unknown names are rejected.
	pub fn service_types(&self) -> Result<Vec<ServiceType>, APIError> {
		self.all("service_type")
			.map(|raw| {
				raw.parse::<ServiceType>()
					.map_err(|e| APIError::bad_request(e.to_string()))
			})
			.collect()
	}

	pub fn status(&self) -> Result<Status, APIError> {
		self.get_or_empty("status")
			.parse::<Status>()
			.map_err(|e| APIError::bad_request(e.to_string()))
	}
}

/// Parses a rollback target from the path.
pub fn parse_version(raw: &str) -> Result<i64, APIError> {
	raw.parse::<i64>()
		.map_err(|_| APIError::bad_request(format!("version must be an integer, got '{}'", raw)))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn params(query: &[(&str, &str)]) -> QueryParams {
		QueryParams::new(
			query
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_string()))
				.collect(),
		)
	}

	#[test]
	fn test_pagination_parsing() {
		let p = params(&[("limit", "2"), ("offset", "3")]).pagination().unwrap();
		assert_eq!(p.limit, Some(2));
		assert_eq!(p.offset, 3);

		let empty = params(&[("limit", "")]).pagination().unwrap();
		assert_eq!(empty, Pagination::default());

		assert!(params(&[("limit", "-1")]).pagination().is_err());
		assert!(params(&[("offset", "two")]).pagination().is_err());
	}

	#[test]
	fn test_repeated_service_types() {
		let types = params(&[("service_type", "Delivery"), ("service_type", "Manufacture")])
			.service_types()
			.unwrap();
		assert_eq!(types, vec![ServiceType::Delivery, ServiceType::Manufacture]);

		assert!(params(&[]).service_types().unwrap().is_empty());
		assert!(params(&[("service_type", "Cleaning")]).service_types().is_err());
	}

	#[test]
	fn test_status_and_version() {
		assert_eq!(params(&[("status", "Closed")]).status().unwrap(), Status::Closed);
		assert!(params(&[]).status().is_err());
		assert_eq!(parse_version("-4").unwrap(), -4);
		assert!(parse_version("v2").is_err());
	}
}
