use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::listings::ListingEntity,
    value_objects::{
        featured_listings::FeatureToggleOutcome,
        listing_lifecycle::RenewOutcome,
        listing_quota::CreateListingOutcome,
        listings::{
            DeleteListingOutcome, ListingView, NewListingModel, UpdateListingModel,
            UpdateListingOutcome,
        },
    },
};

/// Per-owner operations serialise on the owner's user row.
#[async_trait]
#[automock]
pub trait ListingRepository {
    async fn create_within_quota(
        &self,
        owner_id: Uuid,
        new_listing: NewListingModel,
        now: DateTime<Utc>,
    ) -> Result<CreateListingOutcome>;

    async fn list_owned(&self, owner_id: Uuid, now: DateTime<Utc>) -> Result<Vec<ListingView>>;

    async fn browse_active(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<ListingEntity>>;

    async fn find_by_id(&self, listing_id: Uuid) -> Result<Option<ListingEntity>>;

    async fn find_many(&self, listing_ids: Vec<Uuid>) -> Result<Vec<ListingEntity>>;

    async fn update_owned(
        &self,
        listing_id: Uuid,
        requester_id: Uuid,
        changes: UpdateListingModel,
        now: DateTime<Utc>,
    ) -> Result<UpdateListingOutcome>;

    async fn delete_owned(&self, listing_id: Uuid, requester_id: Uuid)
    -> Result<DeleteListingOutcome>;

    async fn renew(
        &self,
        listing_id: Uuid,
        requester_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RenewOutcome>;

    async fn toggle_featured(
        &self,
        listing_id: Uuid,
        requester_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<FeatureToggleOutcome>;
}
