//! In-memory `RiskStore` for router and handler tests.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::db::models::RiskRecord;
use crate::db::store::{HighRiskQuery, RiskStore};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Behaves like a database that refuses connections.
    Connect,
    /// Connects, then the query fails.
    Query,
}

#[derive(Default)]
pub struct MemoryRiskStore {
    rows: Vec<RiskRecord>,
    failure: Option<Failure>,
    calls: AtomicUsize,
}

impl MemoryRiskStore {
    pub fn new(rows: Vec<RiskRecord>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn failing(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    /// Number of store calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self.failure {
            None => Ok(()),
            Some(Failure::Connect) => Err(AppError::Connect(sqlx::Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))),
            Some(Failure::Query) => Err(AppError::Database(sqlx::Error::ColumnNotFound(
                "risk_score".to_string(),
            ))),
        }
    }
}

#[async_trait]
impl RiskStore for MemoryRiskStore {
    async fn patient_visits(&self, patient_id: &str) -> Result<Vec<RiskRecord>> {
        self.check()?;
        let mut rows: Vec<RiskRecord> = self
            .rows
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.visit_no);
        Ok(rows)
    }

    async fn high_risk(&self, query: HighRiskQuery) -> Result<Vec<RiskRecord>> {
        self.check()?;
        let mut rows: Vec<RiskRecord> = self
            .rows
            .iter()
            .filter(|r| query.threshold.admits(r.risk_score))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
        rows.truncate(usize::try_from(query.limit).unwrap_or(0));
        Ok(rows)
    }
}
