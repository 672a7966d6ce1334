use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    #[error("Not found")]
    NotFound,

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest { code, .. } | AppError::Conflict { code, .. } => code,
            AppError::NotFound => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        let code = e.code();
        match e {
            DomainError::NotFound => AppError::NotFound,
            DomainError::IllegalTransition { .. } | DomainError::Conflict { .. } => {
                AppError::Conflict {
                    code,
                    message: e.to_string(),
                }
            }
            DomainError::DuplicateOrderId(_) | DomainError::Internal(_) => {
                AppError::Internal(e.to_string())
            }
            DomainError::EmptyCart
            | DomainError::EmptyGroup(_)
            | DomainError::InvalidPaymentMethod(_)
            | DomainError::UnknownCustomer(_)
            | DomainError::UnknownProduct(_)
            | DomainError::PriceMismatch { .. }
            | DomainError::InsufficientStock { .. }
            | DomainError::InvalidInput(_) => AppError::BadRequest {
                code,
                message: e.to_string(),
            },
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::BadRequest {
            code: "VALIDATION_FAILED",
            message: e.to_string(),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Internal(detail) => {
                log::error!("request failed: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": message,
            "code": self.code(),
        }))
    }
}
