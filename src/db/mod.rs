pub mod models;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use models::RiskRecord;
pub use store::{HighRiskQuery, PgRiskStore, RiskStore};
