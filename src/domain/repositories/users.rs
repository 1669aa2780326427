use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::subscription_plans::{
    SubscriptionChange, SubscriptionChangeKind, SubscriptionSnapshot,
};

#[async_trait]
#[automock]
pub trait UserRepository {
    /// Resolves the user's tier, persisting a lapse before returning.
    /// `None` when the user does not exist.
    async fn resolve_entitlement(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionSnapshot>>;

    /// Applies an upgrade or downgrade and reschedules the user's active
    /// listings to the new plan's lifetime in the same transaction.
    async fn change_subscription(
        &self,
        user_id: Uuid,
        change: SubscriptionChangeKind,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionChange>>;
}
