//! Identity resolution and rights evaluation.
//!
//! Every mutating request runs one of these checks before any write reaches
//! storage.

pub mod identity;
pub mod rights;

pub use identity::IdentityResolver;
pub use rights::RightsEvaluator;
