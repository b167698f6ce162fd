//! Tender and bid lifecycle managers.

pub mod bid;
pub mod tender;

pub use bid::BidManager;
pub use tender::TenderManager;
