use chrono::{DateTime, Utc};

use crate::domain::{
    entities::listings::ListingEntity,
    value_objects::{listing_lifecycle::is_active, subscription_plans::PlanLimits},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureAction {
    Feature,
    Unfeature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureRefusal {
    NotPremium,
    NotFeaturable,
}

/// Decides what a toggle does to a listing the requester owns.
///
/// Featuring needs the tier's permission and an active listing; clearing an
/// existing flag needs only the permission.
pub fn plan_feature_toggle(
    listing: &ListingEntity,
    plan: &PlanLimits,
    is_sold: bool,
    now: DateTime<Utc>,
) -> Result<FeatureAction, FeatureRefusal> {
    if !plan.can_feature {
        return Err(FeatureRefusal::NotPremium);
    }

    if listing.is_featured {
        return Ok(FeatureAction::Unfeature);
    }

    if !is_active(listing, is_sold, now) {
        return Err(FeatureRefusal::NotFeaturable);
    }

    Ok(FeatureAction::Feature)
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureToggleOutcome {
    Featured(ListingEntity),
    Unfeatured(ListingEntity),
    NotFound,
    NotOwner,
    NotPremium,
    NotFeaturable,
}
