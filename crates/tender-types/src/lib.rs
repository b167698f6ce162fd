//! Common types module for the tender service.
//!
//! This module defines the records, enumerations and request payloads shared
//! by every crate in the workspace, so that storage, core logic and the HTTP
//! layer all agree on one encoding.

/// API error types for HTTP responses.
pub mod api;
/// Bid, bid version and feedback records.
pub mod bid;
/// Employees, organizations and responsibility relations.
pub mod directory;
/// Limit/offset pagination over fetched result sets.
pub mod pagination;
/// Registry trait for pluggable implementations.
pub mod registry;
/// Lifecycle status shared by tenders and bids.
pub mod status;
/// Storage namespaces.
pub mod storage;
/// Tender and tender version records.
pub mod tender;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use api::*;
pub use bid::*;
pub use directory::*;
pub use pagination::{Pagination, PaginationError};
pub use registry::ImplementationRegistry;
pub use status::{Status, UnknownVariant};
pub use storage::*;
pub use tender::*;
pub use validation::*;
