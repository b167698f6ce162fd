//! Employees, organizations and who is responsible for which organization.
//!
//! The lifecycle managers only read these records. They are written here,
//! either through startup seeding from configuration or directly.

use crate::clock::creation_time;
use crate::CoreError;
use std::sync::Arc;
use tender_config::DirectoryConfig;
use tender_storage::{storage_key, Batch, StorageError, StorageService};
use tender_types::{
	Employee, NewEmployee, NewOrganization, Organization, ResponsibleRelation, StorageKey,
};

fn conflict(err: StorageError, what: impl FnOnce() -> String) -> CoreError {
	match err {
		StorageError::AlreadyExists(_) => CoreError::Validation(what()),
		other => other.into(),
	}
}

/// Writes directory records.
pub struct Directory {
	storage: Arc<StorageService>,
}

impl Directory {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Registers an employee; usernames are unique.
	pub async fn register_employee(&self, new: NewEmployee) -> Result<Employee, CoreError> {
		if new.username.is_empty() {
			return Err(CoreError::Validation("username cannot be empty".into()));
		}

		let employee = Employee {
			id: new.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
			username: new.username,
			first_name: new.first_name,
			last_name: new.last_name,
			created_at: creation_time(),
		};

		let mut batch = Batch::new();
		batch.insert(
			StorageKey::EmployeeByUsername.as_str(),
			&employee.username,
			&employee.id,
		)?;
		batch.insert(StorageKey::Employees.as_str(), &employee.id, &employee)?;
		self.storage.commit(batch).await.map_err(|e| {
			conflict(e, || {
				format!(
					"employee '{}' or id '{}' already exists",
					employee.username, employee.id
				)
			})
		})?;

		tracing::info!(employee_id = %employee.id, username = %employee.username, "Employee registered");
		Ok(employee)
	}

	pub async fn register_organization(
		&self,
		new: NewOrganization,
	) -> Result<Organization, CoreError> {
		let organization = Organization {
			id: new.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
			name: new.name,
			description: new.description,
			created_at: creation_time(),
		};

		self.storage
			.insert(
				StorageKey::Organizations.as_str(),
				&organization.id,
				&organization,
			)
			.await
			.map_err(|e| {
				conflict(e, || {
					format!("organization '{}' already exists", organization.id)
				})
			})?;

		tracing::info!(organization_id = %organization.id, "Organization registered");
		Ok(organization)
	}

	/// Makes an employee responsible for an organization.
	pub async fn assign_responsible(
		&self,
		organization_id: &str,
		user_id: &str,
	) -> Result<ResponsibleRelation, CoreError> {
		if !self
			.storage
			.exists(StorageKey::Organizations.as_str(), organization_id)
			.await?
		{
			return Err(CoreError::NotFound(format!(
				"organization '{}' not found",
				organization_id
			)));
		}
		if !self
			.storage
			.exists(StorageKey::Employees.as_str(), user_id)
			.await?
		{
			return Err(CoreError::NotFound(format!("employee '{}' not found", user_id)));
		}

		let relation = ResponsibleRelation {
			organization_id: organization_id.to_string(),
			user_id: user_id.to_string(),
		};
		self.storage
			.insert(
				StorageKey::OrganizationResponsible.as_str(),
				&storage_key(organization_id, user_id),
				&relation,
			)
			.await
			.map_err(|e| {
				conflict(e, || {
					format!(
						"employee '{}' is already responsible for '{}'",
						user_id, organization_id
					)
				})
			})?;
		Ok(relation)
	}

	async fn employee_id(&self, username: &str) -> Result<Option<String>, CoreError> {
		match self
			.storage
			.retrieve::<String>(StorageKey::EmployeeByUsername.as_str(), username)
			.await
		{
			Ok(id) => Ok(Some(id)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	async fn organization_named(&self, name: &str) -> Result<Option<Organization>, CoreError> {
		let organizations: Vec<Organization> = self
			.storage
			.list(StorageKey::Organizations.as_str())
			.await?;
		Ok(organizations.into_iter().find(|o| o.name == name))
	}

	/// Creates the configured employees and organizations that are missing.
	///
	/// An employee is skipped when its username exists. An organization is
	/// skipped when its explicit id exists or, without an id, when an
	/// organization of the same name exists. Running it twice writes nothing
	/// the second time.
	pub async fn seed(&self, config: &DirectoryConfig) -> Result<(), CoreError> {
		let mut created = 0usize;

		for seed in &config.employees {
			if self.employee_id(&seed.username).await?.is_some() {
				tracing::debug!(username = %seed.username, "Employee already present");
				continue;
			}
			self.register_employee(NewEmployee {
				id: seed.id.clone(),
				username: seed.username.clone(),
				first_name: seed.first_name.clone(),
				last_name: seed.last_name.clone(),
			})
			.await?;
			created += 1;
		}

		for seed in &config.organizations {
			let present = match &seed.id {
				Some(id) => {
					self.storage
						.exists(StorageKey::Organizations.as_str(), id)
						.await?
				},
				None => self.organization_named(&seed.name).await?.is_some(),
			};
			if present {
				tracing::debug!(name = %seed.name, "Organization already present");
				continue;
			}

			let organization = self
				.register_organization(NewOrganization {
					id: seed.id.clone(),
					name: seed.name.clone(),
					description: seed.description.clone(),
				})
				.await?;
			created += 1;

			for username in &seed.responsible {
				let user_id = self.employee_id(username).await?.ok_or_else(|| {
					CoreError::NotFound(format!("employee '{}' not found", username))
				})?;
				self.assign_responsible(&organization.id, &user_id).await?;
			}
		}

		tracing::info!(created, "Directory seeded");
		Ok(())
	}
}
