use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use mockable::Clock;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::usecases::error_kinds::ErrorKind,
    domain::{
        repositories::users::UserRepository,
        value_objects::{
            payments::{PaymentProxy, PaymentReceipt},
            subscription_plans::{
                PREMIUM_PLAN, PlanLimits, SubscriptionChange, SubscriptionChangeKind,
                SubscriptionSnapshot,
            },
        },
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge_subscription(
        &self,
        user_id: Uuid,
        amount_minor: i64,
        payment: PaymentProxy,
    ) -> AnyResult<PaymentReceipt>;
}

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("user not found")]
    UserNotFound,
    #[error("payment declined: {0}")]
    PaymentDeclined(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SubscriptionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubscriptionError::UserNotFound => ErrorKind::NotFound,
            SubscriptionError::PaymentDeclined(_) => ErrorKind::Validation,
            SubscriptionError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        self.kind().status_code()
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;

/// Entitlement resolution plus the explicit upgrade and downgrade actions.
pub struct SubscriptionUseCase<U, G>
where
    U: UserRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    payment_gateway: Arc<G>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<U, G> SubscriptionUseCase<U, G>
where
    U: UserRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        payment_gateway: Arc<G>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            user_repo,
            payment_gateway,
            clock,
        }
    }

    pub fn list_plans(&self) -> Vec<PlanLimits> {
        PlanLimits::all().to_vec()
    }

    /// Effective tier and limits for `user_id` as of now. A stale premium
    /// status is cleared in storage before this returns.
    pub async fn resolve(&self, user_id: Uuid) -> UseCaseResult<SubscriptionSnapshot> {
        let now = self.clock.utc();
        let snapshot = self
            .user_repo
            .resolve_entitlement(user_id, now)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "subscriptions: failed to resolve entitlement"
                );
                SubscriptionError::Internal(err)
            })?;

        match snapshot {
            Some(snapshot) => {
                info!(
                    %user_id,
                    tier = %snapshot.tier,
                    "subscriptions: entitlement resolved"
                );
                Ok(snapshot)
            }
            None => {
                let err = SubscriptionError::UserNotFound;
                warn!(
                    %user_id,
                    status = err.status_code().as_u16(),
                    "subscriptions: user not found while resolving entitlement"
                );
                Err(err)
            }
        }
    }

    pub async fn upgrade(
        &self,
        user_id: Uuid,
        payment: PaymentProxy,
    ) -> UseCaseResult<SubscriptionChange> {
        info!(
            %user_id,
            payment_method = %payment.payment_method,
            "subscriptions: upgrade requested"
        );

        let current = self.resolve(user_id).await?;
        let amount_minor = PREMIUM_PLAN.monthly_price_minor.unwrap_or_default();

        let receipt = self
            .payment_gateway
            .charge_subscription(user_id, amount_minor, payment)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    amount_minor,
                    error = ?err,
                    "subscriptions: payment gateway failed during upgrade"
                );
                SubscriptionError::Internal(err)
            })?;

        if !receipt.approved {
            let reason = receipt
                .decline_reason
                .unwrap_or_else(|| "payment was not approved".to_string());
            let err = SubscriptionError::PaymentDeclined(reason);
            warn!(
                %user_id,
                tier = %current.tier,
                status = err.status_code().as_u16(),
                "subscriptions: upgrade payment declined"
            );
            return Err(err);
        }

        let change = self
            .apply_change(user_id, SubscriptionChangeKind::Upgrade)
            .await?;

        info!(
            %user_id,
            payment_reference = ?receipt.reference,
            expires_at = ?change.snapshot.subscription_expires_at,
            listings_rescheduled = change.listings_rescheduled,
            "subscriptions: upgrade applied"
        );

        Ok(change)
    }

    pub async fn downgrade(&self, user_id: Uuid) -> UseCaseResult<SubscriptionChange> {
        info!(%user_id, "subscriptions: downgrade requested");

        let change = self
            .apply_change(user_id, SubscriptionChangeKind::Downgrade)
            .await?;

        info!(
            %user_id,
            listings_rescheduled = change.listings_rescheduled,
            "subscriptions: downgrade applied"
        );

        Ok(change)
    }

    async fn apply_change(
        &self,
        user_id: Uuid,
        kind: SubscriptionChangeKind,
    ) -> UseCaseResult<SubscriptionChange> {
        let now = self.clock.utc();
        let change = self
            .user_repo
            .change_subscription(user_id, kind, now)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    change = ?kind,
                    db_error = ?err,
                    "subscriptions: failed to apply subscription change"
                );
                SubscriptionError::Internal(err)
            })?;

        change.ok_or_else(|| {
            let err = SubscriptionError::UserNotFound;
            warn!(
                %user_id,
                change = ?kind,
                status = err.status_code().as_u16(),
                "subscriptions: user disappeared during subscription change"
            );
            err
        })
    }
}
