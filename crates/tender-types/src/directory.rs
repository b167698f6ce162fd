//! Employees, organizations and the relation that lets an employee act for
//! an organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A person who can create tenders, submit bids and leave feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
	pub id: String,
	/// Unique across all employees.
	pub username: String,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
	pub id: String,
	pub name: String,
	pub description: Option<String>,
	pub created_at: DateTime<Utc>,
}

/// Grants `user_id` authority over `organization_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsibleRelation {
	pub organization_id: String,
	pub user_id: String,
}

/// Input for registering an employee.
#[derive(Debug, Clone, Default)]
pub struct NewEmployee {
	/// Generated when absent.
	pub id: Option<String>,
	pub username: String,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
}

/// Input for registering an organization.
#[derive(Debug, Clone, Default)]
pub struct NewOrganization {
	/// Generated when absent.
	pub id: Option<String>,
	pub name: String,
	pub description: Option<String>,
}
