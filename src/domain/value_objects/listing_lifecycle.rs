use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::listings::ListingEntity;

/// Days granted by a manual renewal, regardless of the owner's tier.
pub const RENEWAL_DAYS: i64 = 3;

pub fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(expires_at, Some(at) if at <= now)
}

/// Available, unexpired and unsold. Active listings count against the quota.
pub fn is_active(listing: &ListingEntity, is_sold: bool, now: DateTime<Utc>) -> bool {
    listing.is_available && !is_expired(listing.expires_at, now) && !is_sold
}

/// A listing still flagged available past its expiry.
pub fn needs_lazy_expire(listing: &ListingEntity, now: DateTime<Utc>) -> bool {
    listing.is_available && is_expired(listing.expires_at, now)
}

pub fn lazy_expire_candidates<'a, I>(listings: I, now: DateTime<Utc>) -> Vec<Uuid>
where
    I: IntoIterator<Item = &'a ListingEntity>,
{
    listings
        .into_iter()
        .filter(|listing| needs_lazy_expire(listing, now))
        .map(|listing| listing.id)
        .collect()
}

/// Applies lazy expiry to an in-memory copy, mirroring what the store writes.
pub fn apply_lazy_expire(listing: &mut ListingEntity, now: DateTime<Utc>) -> bool {
    if needs_lazy_expire(listing, now) {
        listing.is_available = false;
        listing.updated_at = now;
        return true;
    }
    false
}

pub fn count_active(listings: &[ListingEntity], sold: &HashSet<Uuid>, now: DateTime<Utc>) -> i64 {
    listings
        .iter()
        .filter(|listing| is_active(listing, sold.contains(&listing.id), now))
        .count() as i64
}

pub fn active_listing_ids(
    listings: &[ListingEntity],
    sold: &HashSet<Uuid>,
    now: DateTime<Utc>,
) -> Vec<Uuid> {
    listings
        .iter()
        .filter(|listing| is_active(listing, sold.contains(&listing.id), now))
        .map(|listing| listing.id)
        .collect()
}

pub fn renewal_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(RENEWAL_DAYS)
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenewOutcome {
    Renewed(ListingEntity),
    NotFound,
    NotOwner,
    Sold,
}
