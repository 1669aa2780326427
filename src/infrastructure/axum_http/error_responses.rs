use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    application::usecases::{
        checkout::CheckoutError, error_kinds::ErrorKind, featured_listings::FeatureError,
        listings::ListingError, order_status::OrderError, subscriptions::SubscriptionError,
    },
    domain::value_objects::listing_quota::QuotaExceeded,
};

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaExceeded>,
}

/// Every failure a handler can return, already classified.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("{message}")]
    UseCase {
        kind: ErrorKind,
        message: String,
        quota: Option<QuotaExceeded>,
    },
}

impl AppError {
    fn classified(kind: ErrorKind, message: String) -> Self {
        // Internal detail is logged by the use case, never sent to the client.
        let message = match kind {
            ErrorKind::Internal => INTERNAL_MESSAGE.to_string(),
            _ => message,
        };
        AppError::UseCase {
            kind,
            message,
            quota: None,
        }
    }

    pub fn quota_exceeded(exceeded: QuotaExceeded) -> Self {
        AppError::UseCase {
            kind: ErrorKind::Conflict,
            message: format!(
                "{} plan allows {} active listings",
                exceeded.tier, exceeded.max_listings
            ),
            quota: Some(exceeded),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::classified(ErrorKind::Validation, message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    code: StatusCode::UNAUTHORIZED.as_u16(),
                    kind: ErrorKind::Authorization,
                    message,
                    quota: None,
                },
            ),
            AppError::UseCase {
                kind,
                message,
                quota,
            } => {
                let status = kind.status_code();
                (
                    status,
                    ErrorResponse {
                        code: status.as_u16(),
                        kind,
                        message,
                        quota,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<SubscriptionError> for AppError {
    fn from(err: SubscriptionError) -> Self {
        AppError::classified(err.kind(), err.to_string())
    }
}

impl From<ListingError> for AppError {
    fn from(err: ListingError) -> Self {
        match err {
            ListingError::QuotaExceeded(exceeded) => AppError::quota_exceeded(exceeded),
            other => AppError::classified(other.kind(), other.to_string()),
        }
    }
}

impl From<FeatureError> for AppError {
    fn from(err: FeatureError) -> Self {
        AppError::classified(err.kind(), err.to_string())
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        AppError::classified(err.kind(), err.to_string())
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        AppError::classified(err.kind(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::enums::subscription_tiers::SubscriptionTier;

    #[test]
    fn internal_detail_is_hidden() {
        let err: AppError = ListingError::Internal(anyhow::anyhow!("relation does not exist")).into();
        assert_eq!(err.to_string(), INTERNAL_MESSAGE);
    }

    #[test]
    fn quota_refusal_keeps_structured_payload() {
        let exceeded = QuotaExceeded {
            current_count: 3,
            max_listings: 3,
            tier: SubscriptionTier::Free,
        };
        let err: AppError = ListingError::QuotaExceeded(exceeded).into();
        match err {
            AppError::UseCase { kind, quota, .. } => {
                assert_eq!(kind, ErrorKind::Conflict);
                assert_eq!(quota, Some(exceeded));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn sold_listing_maps_to_conflict_status() {
        let response = AppError::from(ListingError::Sold).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
