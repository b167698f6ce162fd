//! Maps usernames and author references onto directory records.

use crate::CoreError;
use std::sync::Arc;
use tender_storage::{StorageError, StorageService};
use tender_types::{AuthorType, StorageKey};

/// Resolves acting usernames to employees and checks bid authors.
pub struct IdentityResolver {
	storage: Arc<StorageService>,
}

impl IdentityResolver {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Returns the id of the employee with the given username.
	pub async fn resolve_employee(&self, username: &str) -> Result<String, CoreError> {
		self.storage
			.retrieve::<String>(StorageKey::EmployeeByUsername.as_str(), username)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => {
					CoreError::NotFound(format!("employee '{}' not found", username))
				},
				other => other.into(),
			})
	}

	/// Checks that the referenced author exists.
	///
	/// A `User` author must be an employee id, an `Organization` author an
	/// organization id.
	pub async fn verify_author_exists(
		&self,
		author_type: AuthorType,
		author_id: &str,
	) -> Result<(), CoreError> {
		let namespace = match author_type {
			AuthorType::User => StorageKey::Employees,
			AuthorType::Organization => StorageKey::Organizations,
		};
		if self.storage.exists(namespace.as_str(), author_id).await? {
			Ok(())
		} else {
			Err(CoreError::NotFound(format!(
				"{} author '{}' not found",
				author_type, author_id
			)))
		}
	}
}
