use serde::Serialize;

/// One row of `clinical.patient_risk_scores`: a single visit's computed risk score.
/// Serialized field names match the column names.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RiskRecord {
    pub patient_id: String,
    pub visit_id: String,
    pub visit_no: i64,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub risk_score: f64,
}
