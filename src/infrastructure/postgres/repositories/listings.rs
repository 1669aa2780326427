use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{delete, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::listings::{InsertListingEntity, ListingEntity, UpdateListingEntity},
        repositories::listings::ListingRepository,
        value_objects::{
            featured_listings::{
                FeatureAction, FeatureRefusal, FeatureToggleOutcome, plan_feature_toggle,
            },
            listing_lifecycle::{RenewOutcome, count_active, is_active, is_expired, renewal_expiry},
            listing_quota::{CreateListingOutcome, QuotaDecision, check_listing_quota},
            listings::{
                DeleteListingOutcome, ListingView, NewListingModel, UpdateListingModel,
                UpdateListingOutcome,
            },
        },
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::listings,
        transactions::{
            is_listing_sold, load_owned_with_sold, lock_listing, lock_user,
            resolve_locked_entitlement,
        },
    },
};

pub struct ListingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ListingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

enum Ownership {
    Owned,
    NotFound,
    NotOwner,
}

fn check_ownership(
    conn: &mut PgConnection,
    listing_id: Uuid,
    requester_id: Uuid,
) -> QueryResult<Ownership> {
    let owner_id = listings::table
        .find(listing_id)
        .select(listings::owner_id)
        .first::<Uuid>(conn)
        .optional()?;

    Ok(match owner_id {
        None => Ownership::NotFound,
        Some(owner_id) if owner_id != requester_id => Ownership::NotOwner,
        Some(_) => Ownership::Owned,
    })
}

#[async_trait]
impl ListingRepository for ListingPostgres {
    async fn create_within_quota(
        &self,
        owner_id: Uuid,
        new_listing: NewListingModel,
        now: DateTime<Utc>,
    ) -> Result<CreateListingOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<_, diesel::result::Error, _>(|tx| {
            let Some(owner) = lock_user(tx, owner_id)? else {
                return Ok(CreateListingOutcome::OwnerNotFound);
            };
            let entitlement = resolve_locked_entitlement(tx, &owner, now)?;

            let (owned, sold) = load_owned_with_sold(tx, owner_id, now)?;
            let active_count = count_active(&owned, &sold, now);

            if let QuotaDecision::Exceeded(exceeded) =
                check_listing_quota(active_count, &entitlement.plan)
            {
                return Ok(CreateListingOutcome::QuotaExceeded(exceeded));
            }

            let listing = insert_into(listings::table)
                .values(&InsertListingEntity {
                    owner_id,
                    title: new_listing.title.trim().to_string(),
                    description: new_listing.description,
                    category: new_listing.category.trim().to_string(),
                    sale_price_minor: new_listing.sale_price_minor,
                    rental_price_minor: new_listing.rental_price_minor,
                    is_available: true,
                    is_featured: false,
                    expires_at: Some(entitlement.plan.listing_expiry(now)),
                    created_at: now,
                    updated_at: now,
                })
                .returning(ListingEntity::as_returning())
                .get_result(tx)?;

            Ok(CreateListingOutcome::Created(listing))
        })?;

        Ok(outcome)
    }

    async fn list_owned(&self, owner_id: Uuid, now: DateTime<Utc>) -> Result<Vec<ListingView>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let views = conn.transaction::<_, diesel::result::Error, _>(|tx| {
            let (owned, sold) = load_owned_with_sold(tx, owner_id, now)?;

            Ok(owned
                .into_iter()
                .map(|listing| {
                    let is_sold = sold.contains(&listing.id);
                    ListingView {
                        is_active: is_active(&listing, is_sold, now),
                        is_sold,
                        listing,
                    }
                })
                .collect())
        })?;

        Ok(views)
    }

    async fn browse_active(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<ListingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = listings::table
            .filter(listings::is_available.eq(true))
            .filter(
                listings::expires_at
                    .is_null()
                    .or(listings::expires_at.gt(now)),
            )
            .select(ListingEntity::as_select())
            .order((listings::is_featured.desc(), listings::created_at.desc()))
            .limit(limit)
            .load::<ListingEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_by_id(&self, listing_id: Uuid) -> Result<Option<ListingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = listings::table
            .find(listing_id)
            .select(ListingEntity::as_select())
            .first::<ListingEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_many(&self, listing_ids: Vec<Uuid>) -> Result<Vec<ListingEntity>> {
        if listing_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = listings::table
            .filter(listings::id.eq_any(&listing_ids))
            .select(ListingEntity::as_select())
            .load::<ListingEntity>(&mut conn)?;

        Ok(results)
    }

    async fn update_owned(
        &self,
        listing_id: Uuid,
        requester_id: Uuid,
        changes: UpdateListingModel,
        now: DateTime<Utc>,
    ) -> Result<UpdateListingOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<_, diesel::result::Error, _>(|tx| {
            match check_ownership(tx, listing_id, requester_id)? {
                Ownership::NotFound => return Ok(UpdateListingOutcome::NotFound),
                Ownership::NotOwner => return Ok(UpdateListingOutcome::NotOwner),
                Ownership::Owned => {}
            }

            let Some(owner) = lock_user(tx, requester_id)? else {
                return Ok(UpdateListingOutcome::NotFound);
            };
            let entitlement = resolve_locked_entitlement(tx, &owner, now)?;
            let (owned, sold) = load_owned_with_sold(tx, requester_id, now)?;

            let Some(listing) = lock_listing(tx, listing_id)? else {
                return Ok(UpdateListingOutcome::NotFound);
            };

            // Re-read under the listing lock so a completion that committed
            // while we waited is seen.
            let is_sold = is_listing_sold(tx, listing_id)?;
            if changes.is_available == Some(true) && is_sold {
                return Ok(UpdateListingOutcome::Sold);
            }

            let mut expires_at = None;
            if changes.reactivates(&listing) {
                let others: Vec<ListingEntity> = owned
                    .into_iter()
                    .filter(|other| other.id != listing_id)
                    .collect();
                let active_count = count_active(&others, &sold, now);

                if let QuotaDecision::Exceeded(exceeded) =
                    check_listing_quota(active_count, &entitlement.plan)
                {
                    return Ok(UpdateListingOutcome::QuotaExceeded(exceeded));
                }

                if is_expired(listing.expires_at, now) {
                    expires_at = Some(Some(entitlement.plan.listing_expiry(now)));
                }
            }

            let hides = changes.is_available == Some(false);
            let changeset = UpdateListingEntity {
                title: changes.title.map(|title| title.trim().to_string()),
                description: changes.description,
                category: changes.category.map(|category| category.trim().to_string()),
                sale_price_minor: changes.sale_price_minor.map(Some),
                rental_price_minor: changes.rental_price_minor.map(Some),
                is_available: changes.is_available,
                is_featured: hides.then_some(false),
                expires_at,
                updated_at: Some(now),
            };

            let updated = update(listings::table.find(listing_id))
                .set(&changeset)
                .returning(ListingEntity::as_returning())
                .get_result(tx)?;

            Ok(UpdateListingOutcome::Updated(updated))
        })?;

        Ok(outcome)
    }

    async fn delete_owned(
        &self,
        listing_id: Uuid,
        requester_id: Uuid,
    ) -> Result<DeleteListingOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<_, diesel::result::Error, _>(|tx| {
            let Some(listing) = lock_listing(tx, listing_id)? else {
                return Ok(DeleteListingOutcome::NotFound);
            };
            if listing.owner_id != requester_id {
                return Ok(DeleteListingOutcome::NotOwner);
            }

            delete(listings::table.find(listing_id)).execute(tx)?;
            Ok(DeleteListingOutcome::Deleted)
        })?;

        Ok(outcome)
    }

    async fn renew(
        &self,
        listing_id: Uuid,
        requester_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RenewOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<_, diesel::result::Error, _>(|tx| {
            match check_ownership(tx, listing_id, requester_id)? {
                Ownership::NotFound => return Ok(RenewOutcome::NotFound),
                Ownership::NotOwner => return Ok(RenewOutcome::NotOwner),
                Ownership::Owned => {}
            }

            if lock_user(tx, requester_id)?.is_none() {
                return Ok(RenewOutcome::NotFound);
            }
            if lock_listing(tx, listing_id)?.is_none() {
                return Ok(RenewOutcome::NotFound);
            }

            if is_listing_sold(tx, listing_id)? {
                return Ok(RenewOutcome::Sold);
            }

            let renewed = update(listings::table.find(listing_id))
                .set((
                    listings::expires_at.eq(renewal_expiry(now)),
                    listings::is_available.eq(true),
                    listings::updated_at.eq(now),
                ))
                .returning(ListingEntity::as_returning())
                .get_result(tx)?;

            Ok(RenewOutcome::Renewed(renewed))
        })?;

        Ok(outcome)
    }

    async fn toggle_featured(
        &self,
        listing_id: Uuid,
        requester_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<FeatureToggleOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<_, diesel::result::Error, _>(|tx| {
            match check_ownership(tx, listing_id, requester_id)? {
                Ownership::NotFound => return Ok(FeatureToggleOutcome::NotFound),
                Ownership::NotOwner => return Ok(FeatureToggleOutcome::NotOwner),
                Ownership::Owned => {}
            }

            let Some(owner) = lock_user(tx, requester_id)? else {
                return Ok(FeatureToggleOutcome::NotFound);
            };
            let entitlement = resolve_locked_entitlement(tx, &owner, now)?;

            let Some(listing) = lock_listing(tx, listing_id)? else {
                return Ok(FeatureToggleOutcome::NotFound);
            };
            let is_sold = is_listing_sold(tx, listing_id)?;

            match plan_feature_toggle(&listing, &entitlement.plan, is_sold, now) {
                Err(FeatureRefusal::NotPremium) => Ok(FeatureToggleOutcome::NotPremium),
                Err(FeatureRefusal::NotFeaturable) => Ok(FeatureToggleOutcome::NotFeaturable),
                Ok(FeatureAction::Unfeature) => {
                    let listing = update(listings::table.find(listing_id))
                        .set((
                            listings::is_featured.eq(false),
                            listings::updated_at.eq(now),
                        ))
                        .returning(ListingEntity::as_returning())
                        .get_result(tx)?;
                    Ok(FeatureToggleOutcome::Unfeatured(listing))
                }
                Ok(FeatureAction::Feature) => {
                    update(
                        listings::table
                            .filter(listings::owner_id.eq(requester_id))
                            .filter(listings::id.ne(listing_id))
                            .filter(listings::is_featured.eq(true)),
                    )
                    .set((
                        listings::is_featured.eq(false),
                        listings::updated_at.eq(now),
                    ))
                    .execute(tx)?;

                    let listing = update(listings::table.find(listing_id))
                        .set((listings::is_featured.eq(true), listings::updated_at.eq(now)))
                        .returning(ListingEntity::as_returning())
                        .get_result(tx)?;
                    Ok(FeatureToggleOutcome::Featured(listing))
                }
            }
        })?;

        Ok(outcome)
    }
}
