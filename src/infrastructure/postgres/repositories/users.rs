use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::users::UpdateSubscriptionEntity,
        repositories::users::UserRepository,
        value_objects::{
            listing_lifecycle::active_listing_ids,
            subscription_plans::{
                SubscriptionChange, SubscriptionChangeKind, SubscriptionSnapshot,
                resolve_entitlement, upgraded_expiry,
            },
        },
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{listings, users},
        transactions::{
            clear_featured_slot, load_owned_with_sold, lock_user, resolve_locked_entitlement,
        },
    },
};

pub struct UserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for UserPostgres {
    async fn resolve_entitlement(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionSnapshot>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let snapshot = conn.transaction::<_, diesel::result::Error, _>(|tx| {
            let Some(user) = lock_user(tx, user_id)? else {
                return Ok(None);
            };

            let resolution = resolve_locked_entitlement(tx, &user, now)?;
            Ok(Some(SubscriptionSnapshot::from_resolution(
                user.id,
                &resolution,
            )))
        })?;

        Ok(snapshot)
    }

    async fn change_subscription(
        &self,
        user_id: Uuid,
        change: SubscriptionChangeKind,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionChange>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<_, anyhow::Error, _>(|tx| {
            // Holding the user row keeps listing creation for this user out
            // until the reschedule below has committed.
            let Some(user) = lock_user(tx, user_id)? else {
                return Ok(None);
            };
            let current = resolve_locked_entitlement(tx, &user, now)?;

            let (is_premium, subscription_expires_at) = match change {
                SubscriptionChangeKind::Upgrade => (
                    true,
                    upgraded_expiry(current.is_premium, current.subscription_expires_at, now)?,
                ),
                SubscriptionChangeKind::Downgrade => (false, None),
            };

            update(users::table.find(user_id))
                .set(&UpdateSubscriptionEntity {
                    is_premium,
                    subscription_expires_at,
                    updated_at: now,
                })
                .execute(tx)?;

            if !is_premium {
                clear_featured_slot(tx, user_id, now)?;
            }

            let (owned, sold) = load_owned_with_sold(tx, user_id, now)?;
            let active_ids = active_listing_ids(&owned, &sold, now);

            if !active_ids.is_empty() {
                update(listings::table.filter(listings::id.eq_any(&active_ids)))
                    .set((
                        listings::expires_at.eq(change.target_plan().listing_expiry(now)),
                        listings::updated_at.eq(now),
                    ))
                    .execute(tx)?;
            }

            let resolution = resolve_entitlement(is_premium, subscription_expires_at, now);
            Ok(Some(SubscriptionChange {
                snapshot: SubscriptionSnapshot::from_resolution(user_id, &resolution),
                listings_rescheduled: active_ids.len(),
            }))
        })?;

        Ok(result)
    }
}
