use serde::Serialize;

use crate::domain::{
    entities::listings::ListingEntity,
    value_objects::{enums::subscription_tiers::SubscriptionTier, subscription_plans::PlanLimits},
};

/// Refusal returned when a seller is at their tier's listing cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaExceeded {
    pub current_count: i64,
    pub max_listings: i64,
    pub tier: SubscriptionTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed { remaining: i64 },
    Exceeded(QuotaExceeded),
}

pub fn check_listing_quota(active_count: i64, plan: &PlanLimits) -> QuotaDecision {
    if active_count < plan.max_listings {
        return QuotaDecision::Allowed {
            remaining: plan.max_listings - active_count,
        };
    }

    QuotaDecision::Exceeded(QuotaExceeded {
        current_count: active_count,
        max_listings: plan.max_listings,
        tier: plan.tier,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateListingOutcome {
    Created(ListingEntity),
    QuotaExceeded(QuotaExceeded),
    OwnerNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::subscription_plans::{FREE_PLAN, PREMIUM_PLAN};

    #[test]
    fn free_user_at_three_is_refused() {
        assert_eq!(
            check_listing_quota(3, &FREE_PLAN),
            QuotaDecision::Exceeded(QuotaExceeded {
                current_count: 3,
                max_listings: 3,
                tier: SubscriptionTier::Free,
            })
        );
    }

    #[test]
    fn free_user_below_cap_is_allowed() {
        assert_eq!(
            check_listing_quota(2, &FREE_PLAN),
            QuotaDecision::Allowed { remaining: 1 }
        );
    }

    #[test]
    fn premium_cap_is_eight() {
        assert!(matches!(
            check_listing_quota(7, &PREMIUM_PLAN),
            QuotaDecision::Allowed { remaining: 1 }
        ));
        assert!(matches!(
            check_listing_quota(8, &PREMIUM_PLAN),
            QuotaDecision::Exceeded(_)
        ));
    }

    #[test]
    fn over_cap_after_downgrade_reports_real_count() {
        let QuotaDecision::Exceeded(exceeded) = check_listing_quota(6, &FREE_PLAN) else {
            panic!("expected refusal");
        };
        assert_eq!(exceeded.current_count, 6);
        assert_eq!(exceeded.max_listings, 3);
    }
}
