use axum::response::{IntoResponse, Response};
use thiserror::Error;

use shared::error::AppError;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => ServiceError::Db(e),
            StoreError::Conflict(msg) => ServiceError::App(AppError::with_message(
                shared::error::ErrorCode::AlreadyExists,
                msg,
            )),
            StoreError::Unavailable(msg) => ServiceError::App(AppError::database(msg)),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::Db(e) => {
                tracing::error!(error = %e, "Database error");
                AppError::database("database error").into_response()
            }
            ServiceError::App(e) => e.into_response(),
        }
    }
}
