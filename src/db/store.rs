use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnection};
use sqlx::query::QueryAs;
use sqlx::{Connection, Postgres};
use tracing::{debug, warn};

use crate::config::{DEFAULT_HIGH_RISK_LIMIT, HIGH_RISK_THRESHOLD};
use crate::db::models::RiskRecord;
use crate::error::{AppError, Result};

// Columns are cast so decoding does not depend on the exact types the schema owner picked.
const PATIENT_VISITS_SQL: &str = r#"
    SELECT patient_id::text AS patient_id, visit_id::text AS visit_id,
           visit_no::int8 AS visit_no, age::int8 AS age,
           gender::text AS gender, risk_score::float8 AS risk_score
    FROM clinical.patient_risk_scores
    WHERE patient_id = $1
    ORDER BY visit_no ASC
"#;

const HIGH_RISK_EXCLUSIVE_SQL: &str = r#"
    SELECT patient_id::text AS patient_id, visit_id::text AS visit_id,
           visit_no::int8 AS visit_no, age::int8 AS age,
           gender::text AS gender, risk_score::float8 AS risk_score
    FROM clinical.patient_risk_scores
    WHERE risk_score::float8 > $1
    ORDER BY risk_score DESC
    LIMIT $2
"#;

const HIGH_RISK_INCLUSIVE_SQL: &str = r#"
    SELECT patient_id::text AS patient_id, visit_id::text AS visit_id,
           visit_no::int8 AS visit_no, age::int8 AS age,
           gender::text AS gender, risk_score::float8 AS risk_score
    FROM clinical.patient_risk_scores
    WHERE risk_score::float8 >= $1
    ORDER BY risk_score DESC
    LIMIT $2
"#;

// ---------------------------------------------------------------------------
// Query values
// ---------------------------------------------------------------------------

/// Lower bound on `risk_score` for a high-risk listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub value: f64,
    pub inclusive: bool,
}

impl Threshold {
    /// `risk_score > value`
    pub fn above(value: f64) -> Self {
        Self { value, inclusive: false }
    }

    /// `risk_score >= value`
    pub fn at_least(value: f64) -> Self {
        Self { value, inclusive: true }
    }

    /// Same comparison PostgreSQL applies to float8, where NaN sorts above every number.
    pub fn admits(&self, score: f64) -> bool {
        if score.is_nan() {
            return true;
        }
        if self.inclusive {
            score >= self.value
        } else {
            score > self.value
        }
    }
}

/// Parameters shared by both high-risk routes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighRiskQuery {
    pub threshold: Threshold,
    /// Never negative.
    pub limit: i64,
}

impl HighRiskQuery {
    /// Strict threshold with a client-chosen cap. Negative caps become 0.
    pub fn strict(limit: i64) -> Self {
        Self {
            threshold: Threshold::above(HIGH_RISK_THRESHOLD),
            limit: limit.max(0),
        }
    }

    /// Inclusive threshold with the fixed default cap.
    pub fn inclusive() -> Self {
        Self {
            threshold: Threshold::at_least(HIGH_RISK_THRESHOLD),
            limit: DEFAULT_HIGH_RISK_LIMIT,
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Read access to the risk score table.
#[async_trait]
pub trait RiskStore: Send + Sync {
    /// All visits for one patient, ascending by `visit_no`. May be empty.
    async fn patient_visits(&self, patient_id: &str) -> Result<Vec<RiskRecord>>;

    /// Visits passing `query.threshold`, descending by `risk_score`, at most `query.limit`.
    async fn high_risk(&self, query: HighRiskQuery) -> Result<Vec<RiskRecord>>;
}

/// PostgreSQL store. Opens a fresh connection per call and closes it before returning.
pub struct PgRiskStore {
    database_url: Option<String>,
}

impl PgRiskStore {
    pub fn new(database_url: Option<String>) -> Self {
        Self { database_url }
    }

    async fn connect(&self) -> Result<PgConnection> {
        let url = self
            .database_url
            .as_deref()
            .ok_or(AppError::MissingDatabaseUrl)?;
        PgConnection::connect(url).await.map_err(AppError::Connect)
    }

    /// Runs one query on its own connection. The connection is closed whether
    /// or not the query succeeded; if this future is dropped early the
    /// connection is dropped with it.
    async fn fetch(
        &self,
        query: QueryAs<'_, Postgres, RiskRecord, PgArguments>,
    ) -> Result<Vec<RiskRecord>> {
        let mut conn = self.connect().await?;
        let rows = query.fetch_all(&mut conn).await;
        if let Err(e) = conn.close().await {
            warn!("Failed to close database connection: {e}");
        }
        let rows = rows?;
        debug!("Fetched {} risk rows", rows.len());
        Ok(rows)
    }
}

#[async_trait]
impl RiskStore for PgRiskStore {
    async fn patient_visits(&self, patient_id: &str) -> Result<Vec<RiskRecord>> {
        let query = sqlx::query_as::<_, RiskRecord>(PATIENT_VISITS_SQL).bind(patient_id);
        self.fetch(query).await
    }

    async fn high_risk(&self, query: HighRiskQuery) -> Result<Vec<RiskRecord>> {
        let sql = if query.threshold.inclusive {
            HIGH_RISK_INCLUSIVE_SQL
        } else {
            HIGH_RISK_EXCLUSIVE_SQL
        };
        let query = sqlx::query_as::<_, RiskRecord>(sql)
            .bind(query.threshold.value)
            .bind(query.limit);
        self.fetch(query).await
    }
}
