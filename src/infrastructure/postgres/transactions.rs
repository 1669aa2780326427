//! Statements shared by the repositories. Every function here runs on a
//! connection that is already inside a transaction.
//!
//! Lock order: user row before listing rows, order row before listing row.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use diesel::{dsl::exists, prelude::*, select, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            listings::ListingEntity,
            users::{UpdateSubscriptionEntity, UserEntity},
        },
        value_objects::{
            enums::{order_statuses::OrderStatus, rental_statuses::RentalStatus},
            listing_lifecycle::{apply_lazy_expire, lazy_expire_candidates},
            subscription_plans::{EntitlementResolution, resolve_entitlement},
        },
    },
    infrastructure::postgres::schema::{listings, orders, rentals, users},
};

pub(crate) fn lock_user(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Option<UserEntity>> {
    users::table
        .find(user_id)
        .select(UserEntity::as_select())
        .for_update()
        .first(conn)
        .optional()
}

pub(crate) fn lock_listing(
    conn: &mut PgConnection,
    listing_id: Uuid,
) -> QueryResult<Option<ListingEntity>> {
    listings::table
        .find(listing_id)
        .select(ListingEntity::as_select())
        .for_update()
        .first(conn)
        .optional()
}

/// Resolves the tier of a locked user and writes a lapse back before anything
/// else in the transaction reads it. A lapse also gives up the featured slot.
pub(crate) fn resolve_locked_entitlement(
    conn: &mut PgConnection,
    user: &UserEntity,
    now: DateTime<Utc>,
) -> QueryResult<EntitlementResolution> {
    let resolution = resolve_entitlement(user.is_premium, user.subscription_expires_at, now);

    if resolution.lapsed {
        update(users::table.find(user.id))
            .set(&UpdateSubscriptionEntity {
                is_premium: false,
                subscription_expires_at: None,
                updated_at: now,
            })
            .execute(conn)?;
        clear_featured_slot(conn, user.id, now)?;
    }

    Ok(resolution)
}

/// Unfeatures every listing of `owner_id`. Runs whenever the owner loses the
/// tier that allows featuring.
pub(crate) fn clear_featured_slot(
    conn: &mut PgConnection,
    owner_id: Uuid,
    now: DateTime<Utc>,
) -> QueryResult<usize> {
    update(
        listings::table
            .filter(listings::owner_id.eq(owner_id))
            .filter(listings::is_featured.eq(true)),
    )
    .set((
        listings::is_featured.eq(false),
        listings::updated_at.eq(now),
    ))
    .execute(conn)
}

pub(crate) fn is_listing_sold(conn: &mut PgConnection, listing_id: Uuid) -> QueryResult<bool> {
    let sold_by_order = select(exists(
        orders::table
            .filter(orders::listing_id.eq(listing_id))
            .filter(orders::status.eq(OrderStatus::Completed.to_string())),
    ))
    .get_result::<bool>(conn)?;

    if sold_by_order {
        return Ok(true);
    }

    select(exists(
        rentals::table
            .filter(rentals::listing_id.eq(listing_id))
            .filter(rentals::status.eq(RentalStatus::Completed.to_string())),
    ))
    .get_result::<bool>(conn)
}

pub(crate) fn sold_listing_ids(
    conn: &mut PgConnection,
    listing_ids: &[Uuid],
) -> QueryResult<HashSet<Uuid>> {
    if listing_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let by_orders: Vec<Option<Uuid>> = orders::table
        .filter(orders::listing_id.eq_any(listing_ids))
        .filter(orders::status.eq(OrderStatus::Completed.to_string()))
        .select(orders::listing_id)
        .distinct()
        .load(conn)?;

    let by_rentals: Vec<Option<Uuid>> = rentals::table
        .filter(rentals::listing_id.eq_any(listing_ids))
        .filter(rentals::status.eq(RentalStatus::Completed.to_string()))
        .select(rentals::listing_id)
        .distinct()
        .load(conn)?;

    Ok(by_orders.into_iter().chain(by_rentals).flatten().collect())
}

/// Loads every listing of `owner_id`, newest first, after flipping the ones
/// whose expiry has passed to unavailable.
pub(crate) fn load_owned_with_lazy_expire(
    conn: &mut PgConnection,
    owner_id: Uuid,
    now: DateTime<Utc>,
) -> QueryResult<Vec<ListingEntity>> {
    let mut owned = listings::table
        .filter(listings::owner_id.eq(owner_id))
        .select(ListingEntity::as_select())
        .order(listings::created_at.desc())
        .load::<ListingEntity>(conn)?;

    let stale = lazy_expire_candidates(&owned, now);
    if !stale.is_empty() {
        update(listings::table.filter(listings::id.eq_any(&stale)))
            .set((
                listings::is_available.eq(false),
                listings::updated_at.eq(now),
            ))
            .execute(conn)?;

        for listing in owned.iter_mut() {
            apply_lazy_expire(listing, now);
        }
    }

    Ok(owned)
}

/// Owned listings after lazy expiry, plus the subset that is sold.
pub(crate) fn load_owned_with_sold(
    conn: &mut PgConnection,
    owner_id: Uuid,
    now: DateTime<Utc>,
) -> QueryResult<(Vec<ListingEntity>, HashSet<Uuid>)> {
    let owned = load_owned_with_lazy_expire(conn, owner_id, now)?;
    let ids: Vec<Uuid> = owned.iter().map(|listing| listing.id).collect();
    let sold = sold_listing_ids(conn, &ids)?;
    Ok((owned, sold))
}
