use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::users::UserEntity, value_objects::enums::subscription_tiers::SubscriptionTier,
};

/// Length of one paid subscription period.
pub const SUBSCRIPTION_PERIOD_MONTHS: u32 = 1;

/// Limits attached to a tier. Static configuration, never stored per user.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PlanLimits {
    pub tier: SubscriptionTier,
    pub max_listings: i64,
    pub listing_days: i64,
    pub can_feature: bool,
    pub monthly_price_minor: Option<i64>,
}

pub const FREE_PLAN: PlanLimits = PlanLimits {
    tier: SubscriptionTier::Free,
    max_listings: 3,
    listing_days: 3,
    can_feature: false,
    monthly_price_minor: None,
};

pub const PREMIUM_PLAN: PlanLimits = PlanLimits {
    tier: SubscriptionTier::Premium,
    max_listings: 8,
    listing_days: 7,
    can_feature: true,
    monthly_price_minor: Some(500),
};

impl PlanLimits {
    pub fn for_tier(tier: SubscriptionTier) -> Self {
        match tier {
            SubscriptionTier::Free => FREE_PLAN,
            SubscriptionTier::Premium => PREMIUM_PLAN,
        }
    }

    pub fn all() -> [PlanLimits; 2] {
        [FREE_PLAN, PREMIUM_PLAN]
    }

    /// Expiry stamped on a listing created or rescheduled under this plan.
    pub fn listing_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(self.listing_days)
    }
}

/// Outcome of evaluating a user row against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitlementResolution {
    pub plan: PlanLimits,
    /// The stored premium status is stale and must be cleared before use.
    pub lapsed: bool,
    pub is_premium: bool,
    pub subscription_expires_at: Option<DateTime<Utc>>,
}

/// Resolves the effective tier of a user.
///
/// A premium user whose expiry has been reached is treated as free and the
/// returned resolution carries the cleared fields; the caller persists them.
/// A premium user with no expiry holds an open-ended grant.
pub fn resolve_entitlement(
    is_premium: bool,
    subscription_expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> EntitlementResolution {
    if !is_premium {
        return EntitlementResolution {
            plan: FREE_PLAN,
            lapsed: false,
            is_premium: false,
            subscription_expires_at,
        };
    }

    match subscription_expires_at {
        Some(expires_at) if expires_at <= now => EntitlementResolution {
            plan: FREE_PLAN,
            lapsed: true,
            is_premium: false,
            subscription_expires_at: None,
        },
        _ => EntitlementResolution {
            plan: PREMIUM_PLAN,
            lapsed: false,
            is_premium: true,
            subscription_expires_at,
        },
    }
}

/// Expiry after a successful upgrade payment.
///
/// Renewals stack on a running subscription instead of resetting it. An
/// open-ended grant stays open-ended.
pub fn upgraded_expiry(
    is_premium: bool,
    subscription_expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    let current = resolve_entitlement(is_premium, subscription_expires_at, now);
    let base = match (current.is_premium, current.subscription_expires_at) {
        (true, None) => return Ok(None),
        (true, Some(expires_at)) => expires_at,
        (false, _) => now,
    };

    let expires_at = base
        .checked_add_months(Months::new(SUBSCRIPTION_PERIOD_MONTHS))
        .context("failed to compute subscription expiry")?;

    Ok(Some(expires_at))
}

/// Which way a subscription change goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionChangeKind {
    Upgrade,
    Downgrade,
}

impl SubscriptionChangeKind {
    pub fn target_plan(&self) -> PlanLimits {
        match self {
            SubscriptionChangeKind::Upgrade => PREMIUM_PLAN,
            SubscriptionChangeKind::Downgrade => FREE_PLAN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionSnapshot {
    pub user_id: Uuid,
    pub tier: SubscriptionTier,
    pub is_premium: bool,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub limits: PlanLimits,
}

impl SubscriptionSnapshot {
    pub fn from_resolution(user_id: Uuid, resolution: &EntitlementResolution) -> Self {
        Self {
            user_id,
            tier: resolution.plan.tier,
            is_premium: resolution.is_premium,
            subscription_expires_at: resolution.subscription_expires_at,
            limits: resolution.plan,
        }
    }

    pub fn from_user(user: &UserEntity, now: DateTime<Utc>) -> Self {
        let resolution = resolve_entitlement(user.is_premium, user.subscription_expires_at, now);
        Self::from_resolution(user.id, &resolution)
    }
}

/// Result of an upgrade or downgrade, including how many active listings had
/// their expiry moved to the new plan's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionChange {
    #[serde(flatten)]
    pub snapshot: SubscriptionSnapshot,
    pub listings_rescheduled: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn free_user_resolves_to_free_plan() {
        let resolution = resolve_entitlement(false, None, now());
        assert_eq!(resolution.plan, FREE_PLAN);
        assert!(!resolution.lapsed);
    }

    #[test]
    fn unexpired_premium_keeps_premium_limits() {
        let resolution = resolve_entitlement(true, Some(now() + Duration::days(2)), now());
        assert_eq!(resolution.plan.max_listings, 8);
        assert!(resolution.plan.can_feature);
        assert!(!resolution.lapsed);
    }

    #[test]
    fn open_ended_premium_never_lapses() {
        let resolution = resolve_entitlement(true, None, now());
        assert_eq!(resolution.plan.tier, SubscriptionTier::Premium);
        assert!(!resolution.lapsed);
    }

    #[test]
    fn stale_premium_lapses_and_clears_both_fields() {
        let resolution = resolve_entitlement(true, Some(now() - Duration::seconds(1)), now());
        assert!(resolution.lapsed);
        assert!(!resolution.is_premium);
        assert_eq!(resolution.subscription_expires_at, None);
        assert_eq!(resolution.plan, FREE_PLAN);
    }

    #[test]
    fn premium_expiring_exactly_now_is_lapsed() {
        let resolution = resolve_entitlement(true, Some(now()), now());
        assert!(resolution.lapsed);
        assert!(!resolution.is_premium);
        assert_eq!(resolution.subscription_expires_at, None);
    }

    #[test]
    fn upgrade_from_free_starts_one_month_from_now() {
        let expires_at = upgraded_expiry(false, None, now()).unwrap();
        assert_eq!(
            expires_at,
            Some(Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn upgrade_while_premium_stacks_on_existing_expiry() {
        let current = Utc.with_ymd_and_hms(2026, 3, 25, 0, 0, 0).unwrap();
        let expires_at = upgraded_expiry(true, Some(current), now()).unwrap();
        assert_eq!(
            expires_at,
            Some(Utc.with_ymd_and_hms(2026, 4, 25, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn upgrade_after_lapse_restarts_from_now() {
        let stale = now() - Duration::days(5);
        let expires_at = upgraded_expiry(true, Some(stale), now()).unwrap();
        assert_eq!(
            expires_at,
            Some(Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn upgrade_keeps_open_ended_grant() {
        assert_eq!(upgraded_expiry(true, None, now()).unwrap(), None);
    }

    #[test]
    fn plan_listing_expiry_uses_tier_lifetime() {
        assert_eq!(FREE_PLAN.listing_expiry(now()), now() + Duration::days(3));
        assert_eq!(PREMIUM_PLAN.listing_expiry(now()), now() + Duration::days(7));
    }
}
