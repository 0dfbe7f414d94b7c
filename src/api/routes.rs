use std::num::IntErrorKind;
use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::api::health::{health, root};
use crate::config::DEFAULT_HIGH_RISK_LIMIT;
use crate::db::{HighRiskQuery, RiskRecord, RiskStore};
use crate::error::AppError;

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn RiskStore>,
}

impl ApiState {
    pub fn new(store: impl RiskStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/patient/:patient_id", get(get_patient_visits))
        .route("/api/patients/high-risk", get(get_high_risk))
        // Legacy paths, kept for existing clients.
        .route("/ap/patent/:patent_id", get(get_patient_visits))
        .route("/ap/patents/hgh-rsk", get(get_high_risk_inclusive))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

/// Raw `limit` for the high-risk listing. Read from the query pairs directly so
/// repeated keys and malformed values never turn into a 400.
pub struct HighRiskParams {
    pub limit: Option<String>,
}

impl HighRiskParams {
    /// First `limit` wins; later repeats are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self {
            limit: pairs
                .into_iter()
                .find(|(key, _)| key == "limit")
                .map(|(_, value)| value),
        }
    }

    /// Non-integers fall back to the default. Integers past the i64 range saturate.
    pub fn limit(&self) -> i64 {
        let Some(raw) = self.limit.as_deref() else {
            return DEFAULT_HIGH_RISK_LIMIT;
        };
        match raw.trim().parse::<i64>() {
            Ok(limit) => limit,
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => i64::MAX,
                IntErrorKind::NegOverflow => i64::MIN,
                _ => DEFAULT_HIGH_RISK_LIMIT,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_patient_visits(
    State(state): State<ApiState>,
    patient_id: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<RiskRecord>>, AppError> {
    // An id that does not decode as UTF-8 cannot match a stored text id.
    let Path(patient_id) = patient_id.map_err(|rejection| {
        debug!("Rejected patient id: {rejection}");
        AppError::PatientNotFound(rejection.body_text())
    })?;
    let rows = state.store.patient_visits(&patient_id).await?;
    if rows.is_empty() {
        return Err(AppError::PatientNotFound(patient_id));
    }
    Ok(Json(rows))
}

async fn get_high_risk(
    State(state): State<ApiState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<RiskRecord>>, AppError> {
    let params = HighRiskParams::from_pairs(pairs);
    let rows = state.store.high_risk(HighRiskQuery::strict(params.limit())).await?;
    Ok(Json(rows))
}

/// Ignores any `limit` parameter.
async fn get_high_risk_inclusive(
    State(state): State<ApiState>,
) -> Result<Json<Vec<RiskRecord>>, AppError> {
    let rows = state.store.high_risk(HighRiskQuery::inclusive()).await?;
    Ok(Json(rows))
}

async fn not_found(uri: axum::http::Uri) -> impl IntoResponse {
    debug!("No route for {uri}");
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not found" })),
    )
}
