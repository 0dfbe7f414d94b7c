use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,

    #[error("Database connection error: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("No visits found for patient {0}")]
    PatientNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::PatientNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client. Internal detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::PatientNotFound(_) => "patient not found",
            AppError::MissingDatabaseUrl | AppError::Connect(_) => "database connection failed",
            _ => "internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {self}");
        } else {
            debug!("{self}");
        }
        let body = serde_json::json!({ "error": self.public_message() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::PatientNotFound("P404".to_string());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "patient not found");
    }

    #[test]
    fn connection_failures_share_one_message() {
        let missing = AppError::MissingDatabaseUrl;
        let refused = AppError::Connect(sqlx::Error::PoolTimedOut);
        for err in [missing, refused] {
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.public_message(), "database connection failed");
        }
    }

    #[test]
    fn query_failures_hide_details() {
        let err = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "internal server error");
    }
}
