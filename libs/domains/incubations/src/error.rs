use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, is_duplicate_key};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IncubationError {
    #[error("Incubation isn't empty or not found")]
    IncubationUnavailable,

    #[error("child not found or he isn't your child")]
    ChildNotOwned,

    #[error("hospital not found")]
    HospitalNotFound,

    #[error("hospital can't receive online payments yet")]
    PayoutAccountMissing,

    #[error("incubation reservation not found")]
    ReservationNotFound,

    #[error("Not Incubation Reservations added yet")]
    NoReservations,

    #[error("No Incubation Available within {0} meters")]
    NoneNearby(f64),

    #[error("{0} accounts can't access incubation reservations")]
    RoleNotAllowed(axum_helpers::Role),

    #[error("invalid booking metadata: {0}")]
    InvalidMetadata(String),

    #[error("Webhook Error: {0}")]
    InvalidSignature(String),

    #[error("{0}")]
    Validation(String),

    #[error("Payment processor error: {0}")]
    PaymentGateway(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type IncubationResult<T> = Result<T, IncubationError>;

impl From<IncubationError> for AppError {
    fn from(err: IncubationError) -> Self {
        match err {
            IncubationError::IncubationUnavailable
            | IncubationError::ChildNotOwned
            | IncubationError::HospitalNotFound
            | IncubationError::ReservationNotFound
            | IncubationError::NoReservations
            | IncubationError::NoneNearby(_) => AppError::NotFound(err.to_string()),
            IncubationError::PayoutAccountMissing => AppError::Conflict(err.to_string()),
            IncubationError::RoleNotAllowed(_) => AppError::Forbidden(err.to_string()),
            IncubationError::InvalidMetadata(_) => AppError::BadRequest(err.to_string()),
            IncubationError::InvalidSignature(_) => AppError::InvalidSignature(err.to_string()),
            IncubationError::Validation(msg) => AppError::BadRequest(msg),
            IncubationError::PaymentGateway(msg) => AppError::BadGateway(msg),
            // A second delivery racing the first trips the paymentIntent index.
            IncubationError::Database(e) if is_duplicate_key(&e) => {
                AppError::Conflict("payment already recorded".to_string())
            }
            IncubationError::Database(e) => AppError::Mongo(e),
            IncubationError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for IncubationError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<reqwest::Error> for IncubationError {
    fn from(err: reqwest::Error) -> Self {
        IncubationError::PaymentGateway(err.to_string())
    }
}

impl From<validator::ValidationErrors> for IncubationError {
    fn from(err: validator::ValidationErrors) -> Self {
        IncubationError::Validation(err.to_string())
    }
}
