use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::usecases::error_kinds::ErrorKind,
    domain::{
        entities::listings::ListingEntity,
        repositories::listings::ListingRepository,
        value_objects::{
            listing_lifecycle::RenewOutcome,
            listing_quota::{CreateListingOutcome, QuotaExceeded},
            listings::{
                DEFAULT_BROWSE_LIMIT, DeleteListingOutcome, ListingValidationError, ListingView,
                MAX_BROWSE_LIMIT, NewListingModel, UpdateListingModel, UpdateListingOutcome,
            },
        },
    },
};

#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Validation(#[from] ListingValidationError),
    #[error("limit must be between 1 and {max}")]
    InvalidLimit { max: i64 },
    #[error("user not found")]
    OwnerNotFound,
    #[error("listing not found")]
    NotFound,
    #[error("listing belongs to another seller")]
    NotOwner,
    #[error("listing has been sold")]
    Sold,
    #[error("listing quota exceeded: {} of {} active", .0.current_count, .0.max_listings)]
    QuotaExceeded(QuotaExceeded),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ListingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ListingError::Validation(_) | ListingError::InvalidLimit { .. } => {
                ErrorKind::Validation
            }
            ListingError::OwnerNotFound | ListingError::NotFound => ErrorKind::NotFound,
            ListingError::NotOwner => ErrorKind::Authorization,
            ListingError::Sold | ListingError::QuotaExceeded(_) => ErrorKind::Conflict,
            ListingError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        self.kind().status_code()
    }
}

pub type UseCaseResult<T> = std::result::Result<T, ListingError>;

/// Creating a listing either succeeds or hits the tier cap. Hitting the cap
/// is an ordinary outcome the caller turns into an upsell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ListingCreation {
    Created { listing: ListingEntity },
    QuotaExceeded(QuotaExceeded),
}

pub struct ListingUseCase<L>
where
    L: ListingRepository + Send + Sync + 'static,
{
    listing_repo: Arc<L>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<L> ListingUseCase<L>
where
    L: ListingRepository + Send + Sync + 'static,
{
    pub fn new(listing_repo: Arc<L>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            listing_repo,
            clock,
        }
    }

    pub async fn create_listing(
        &self,
        owner_id: Uuid,
        new_listing: NewListingModel,
    ) -> UseCaseResult<ListingCreation> {
        info!(%owner_id, category = %new_listing.category, "listings: create requested");

        new_listing.validate().map_err(|err| {
            let err = ListingError::Validation(err);
            warn!(
                %owner_id,
                error = %err,
                status = err.status_code().as_u16(),
                "listings: invalid listing fields"
            );
            err
        })?;

        let now = self.clock.utc();
        let outcome = self
            .listing_repo
            .create_within_quota(owner_id, new_listing, now)
            .await
            .map_err(|err| {
                error!(
                    %owner_id,
                    db_error = ?err,
                    "listings: failed to create listing"
                );
                ListingError::Internal(err)
            })?;

        match outcome {
            CreateListingOutcome::Created(listing) => {
                info!(
                    %owner_id,
                    listing_id = %listing.id,
                    expires_at = ?listing.expires_at,
                    "listings: listing created"
                );
                Ok(ListingCreation::Created { listing })
            }
            CreateListingOutcome::QuotaExceeded(exceeded) => {
                warn!(
                    %owner_id,
                    current_count = exceeded.current_count,
                    max_listings = exceeded.max_listings,
                    tier = %exceeded.tier,
                    status = ErrorKind::Conflict.status_code().as_u16(),
                    "listings: listing quota reached"
                );
                Ok(ListingCreation::QuotaExceeded(exceeded))
            }
            CreateListingOutcome::OwnerNotFound => {
                let err = ListingError::OwnerNotFound;
                warn!(
                    %owner_id,
                    status = err.status_code().as_u16(),
                    "listings: owner not found"
                );
                Err(err)
            }
        }
    }

    /// The owner's listings after lazy expiry has been applied.
    pub async fn list_my_listings(&self, owner_id: Uuid) -> UseCaseResult<Vec<ListingView>> {
        let now = self.clock.utc();
        let listings = self
            .listing_repo
            .list_owned(owner_id, now)
            .await
            .map_err(|err| {
                error!(
                    %owner_id,
                    db_error = ?err,
                    "listings: failed to list owned listings"
                );
                ListingError::Internal(err)
            })?;

        info!(
            %owner_id,
            listing_count = listings.len(),
            "listings: owned listings loaded"
        );
        Ok(listings)
    }

    pub async fn browse(&self, limit: Option<i64>) -> UseCaseResult<Vec<ListingEntity>> {
        let limit = limit.unwrap_or(DEFAULT_BROWSE_LIMIT);
        if !(1..=MAX_BROWSE_LIMIT).contains(&limit) {
            return Err(ListingError::InvalidLimit {
                max: MAX_BROWSE_LIMIT,
            });
        }

        let now = self.clock.utc();
        self.listing_repo
            .browse_active(now, limit)
            .await
            .map_err(|err| {
                error!(limit, db_error = ?err, "listings: failed to browse listings");
                ListingError::Internal(err)
            })
    }

    pub async fn get_listing(&self, listing_id: Uuid) -> UseCaseResult<ListingEntity> {
        let listing = self
            .listing_repo
            .find_by_id(listing_id)
            .await
            .map_err(|err| {
                error!(
                    %listing_id,
                    db_error = ?err,
                    "listings: failed to load listing"
                );
                ListingError::Internal(err)
            })?;

        listing.ok_or(ListingError::NotFound)
    }

    pub async fn update_listing(
        &self,
        requester_id: Uuid,
        listing_id: Uuid,
        changes: UpdateListingModel,
    ) -> UseCaseResult<ListingEntity> {
        info!(%requester_id, %listing_id, "listings: update requested");
        changes.validate()?;

        let now = self.clock.utc();
        let outcome = self
            .listing_repo
            .update_owned(listing_id, requester_id, changes, now)
            .await
            .map_err(|err| {
                error!(
                    %requester_id,
                    %listing_id,
                    db_error = ?err,
                    "listings: failed to update listing"
                );
                ListingError::Internal(err)
            })?;

        let err = match outcome {
            UpdateListingOutcome::Updated(listing) => {
                info!(%requester_id, %listing_id, "listings: listing updated");
                return Ok(listing);
            }
            UpdateListingOutcome::NotFound => ListingError::NotFound,
            UpdateListingOutcome::NotOwner => ListingError::NotOwner,
            UpdateListingOutcome::Sold => ListingError::Sold,
            UpdateListingOutcome::QuotaExceeded(exceeded) => ListingError::QuotaExceeded(exceeded),
        };

        warn!(
            %requester_id,
            %listing_id,
            error = %err,
            status = err.status_code().as_u16(),
            "listings: update refused"
        );
        Err(err)
    }

    pub async fn delete_listing(&self, requester_id: Uuid, listing_id: Uuid) -> UseCaseResult<()> {
        info!(%requester_id, %listing_id, "listings: delete requested");

        let outcome = self
            .listing_repo
            .delete_owned(listing_id, requester_id)
            .await
            .map_err(|err| {
                error!(
                    %requester_id,
                    %listing_id,
                    db_error = ?err,
                    "listings: failed to delete listing"
                );
                ListingError::Internal(err)
            })?;

        match outcome {
            DeleteListingOutcome::Deleted => {
                info!(%requester_id, %listing_id, "listings: listing deleted");
                Ok(())
            }
            DeleteListingOutcome::NotFound => Err(ListingError::NotFound),
            DeleteListingOutcome::NotOwner => {
                let err = ListingError::NotOwner;
                warn!(
                    %requester_id,
                    %listing_id,
                    status = err.status_code().as_u16(),
                    "listings: delete by non-owner refused"
                );
                Err(err)
            }
        }
    }

    /// Extends a listing by the fixed renewal period and makes it available
    /// again. Sold listings are never renewed.
    pub async fn renew_listing(
        &self,
        requester_id: Uuid,
        listing_id: Uuid,
    ) -> UseCaseResult<ListingEntity> {
        info!(%requester_id, %listing_id, "listings: renewal requested");

        let now = self.clock.utc();
        let outcome = self
            .listing_repo
            .renew(listing_id, requester_id, now)
            .await
            .map_err(|err| {
                error!(
                    %requester_id,
                    %listing_id,
                    db_error = ?err,
                    "listings: failed to renew listing"
                );
                ListingError::Internal(err)
            })?;

        let err = match outcome {
            RenewOutcome::Renewed(listing) => {
                info!(
                    %requester_id,
                    %listing_id,
                    expires_at = ?listing.expires_at,
                    "listings: listing renewed"
                );
                return Ok(listing);
            }
            RenewOutcome::NotFound => ListingError::NotFound,
            RenewOutcome::NotOwner => ListingError::NotOwner,
            RenewOutcome::Sold => ListingError::Sold,
        };

        warn!(
            %requester_id,
            %listing_id,
            error = %err,
            status = err.status_code().as_u16(),
            "listings: renewal refused"
        );
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::usecases::test_support::{fixture_clock, fixture_now},
        domain::{
            repositories::listings::MockListingRepository,
            value_objects::{
                enums::subscription_tiers::SubscriptionTier, listing_lifecycle::renewal_expiry,
            },
        },
    };
    use chrono::Duration;
    use mockall::predicate::eq;

    fn new_listing() -> NewListingModel {
        NewListingModel {
            title: "Ludwig Supraphonic".to_string(),
            description: "14x5 snare".to_string(),
            category: "drums".to_string(),
            sale_price_minor: Some(32_000),
            rental_price_minor: None,
        }
    }

    fn stored_listing(owner_id: Uuid) -> ListingEntity {
        let now = fixture_now();
        ListingEntity {
            id: Uuid::new_v4(),
            owner_id,
            title: "Ludwig Supraphonic".to_string(),
            description: "14x5 snare".to_string(),
            category: "drums".to_string(),
            sale_price_minor: Some(32_000),
            rental_price_minor: None,
            is_available: true,
            is_featured: false,
            expires_at: Some(now + Duration::days(3)),
            created_at: now,
            updated_at: now,
        }
    }

    fn usecase(repo: MockListingRepository) -> ListingUseCase<MockListingRepository> {
        ListingUseCase::new(Arc::new(repo), fixture_clock())
    }

    #[tokio::test]
    async fn create_returns_created_listing() {
        let owner_id = Uuid::new_v4();
        let listing = stored_listing(owner_id);
        let expected = listing.clone();
        let mut repo = MockListingRepository::new();

        repo.expect_create_within_quota()
            .withf(move |id, model, now| *id == owner_id && model.category == "drums" && *now == fixture_now())
            .times(1)
            .returning(move |_, _, _| {
                let listing = listing.clone();
                Box::pin(async move { Ok(CreateListingOutcome::Created(listing)) })
            });

        let created = usecase(repo)
            .create_listing(owner_id, new_listing())
            .await
            .unwrap();
        assert_eq!(created, ListingCreation::Created { listing: expected });
    }

    #[tokio::test]
    async fn free_user_at_cap_gets_quota_exceeded_outcome() {
        let owner_id = Uuid::new_v4();
        let exceeded = QuotaExceeded {
            current_count: 3,
            max_listings: 3,
            tier: SubscriptionTier::Free,
        };
        let mut repo = MockListingRepository::new();

        repo.expect_create_within_quota().returning(move |_, _, _| {
            Box::pin(async move { Ok(CreateListingOutcome::QuotaExceeded(exceeded)) })
        });

        let outcome = usecase(repo)
            .create_listing(owner_id, new_listing())
            .await
            .unwrap();
        assert_eq!(outcome, ListingCreation::QuotaExceeded(exceeded));
    }

    #[tokio::test]
    async fn invalid_fields_never_reach_storage() {
        let mut repo = MockListingRepository::new();
        repo.expect_create_within_quota().never();

        let mut model = new_listing();
        model.sale_price_minor = None;

        let err = usecase(repo)
            .create_listing(Uuid::new_v4(), model)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ListingError::Validation(ListingValidationError::MissingPrice)
        ));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn create_for_unknown_owner_is_not_found() {
        let mut repo = MockListingRepository::new();
        repo.expect_create_within_quota()
            .returning(|_, _, _| Box::pin(async { Ok(CreateListingOutcome::OwnerNotFound) }));

        let err = usecase(repo)
            .create_listing(Uuid::new_v4(), new_listing())
            .await
            .unwrap_err();
        assert!(matches!(err, ListingError::OwnerNotFound));
    }

    #[tokio::test]
    async fn renew_sold_listing_is_conflict() {
        let mut repo = MockListingRepository::new();
        repo.expect_renew()
            .returning(|_, _, _| Box::pin(async { Ok(RenewOutcome::Sold) }));

        let err = usecase(repo)
            .renew_listing(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ListingError::Sold));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn renew_by_owner_returns_extended_listing() {
        let owner_id = Uuid::new_v4();
        let mut listing = stored_listing(owner_id);
        listing.expires_at = Some(renewal_expiry(fixture_now()));
        let listing_id = listing.id;
        let mut repo = MockListingRepository::new();

        repo.expect_renew()
            .with(eq(listing_id), eq(owner_id), eq(fixture_now()))
            .returning(move |_, _, _| {
                let listing = listing.clone();
                Box::pin(async move { Ok(RenewOutcome::Renewed(listing)) })
            });

        let renewed = usecase(repo)
            .renew_listing(owner_id, listing_id)
            .await
            .unwrap();
        assert_eq!(renewed.expires_at, Some(fixture_now() + Duration::days(3)));
    }

    #[tokio::test]
    async fn renew_by_stranger_is_authorization_error() {
        let mut repo = MockListingRepository::new();
        repo.expect_renew()
            .returning(|_, _, _| Box::pin(async { Ok(RenewOutcome::NotOwner) }));

        let err = usecase(repo)
            .renew_listing(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn reactivating_sold_listing_is_refused() {
        let mut repo = MockListingRepository::new();
        repo.expect_update_owned()
            .returning(|_, _, _, _| Box::pin(async { Ok(UpdateListingOutcome::Sold) }));

        let changes = UpdateListingModel {
            is_available: Some(true),
            ..UpdateListingModel::default()
        };
        let err = usecase(repo)
            .update_listing(Uuid::new_v4(), Uuid::new_v4(), changes)
            .await
            .unwrap_err();
        assert!(matches!(err, ListingError::Sold));
    }

    #[tokio::test]
    async fn empty_update_is_validation_error() {
        let mut repo = MockListingRepository::new();
        repo.expect_update_owned().never();

        let err = usecase(repo)
            .update_listing(Uuid::new_v4(), Uuid::new_v4(), UpdateListingModel::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn browse_rejects_out_of_range_limit() {
        let mut repo = MockListingRepository::new();
        repo.expect_browse_active().never();

        let err = usecase(repo).browse(Some(0)).await.unwrap_err();
        assert!(matches!(err, ListingError::InvalidLimit { max: 100 }));
    }

    #[tokio::test]
    async fn browse_uses_default_limit() {
        let mut repo = MockListingRepository::new();
        repo.expect_browse_active()
            .with(eq(fixture_now()), eq(DEFAULT_BROWSE_LIMIT))
            .returning(|_, _| Box::pin(async { Ok(Vec::new()) }));

        let listings = usecase(repo).browse(None).await.unwrap();
        assert!(listings.is_empty());
    }

    #[tokio::test]
    async fn get_missing_listing_is_not_found() {
        let mut repo = MockListingRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let err = usecase(repo).get_listing(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ListingError::NotFound));
    }

    #[tokio::test]
    async fn delete_by_stranger_is_refused() {
        let mut repo = MockListingRepository::new();
        repo.expect_delete_owned()
            .returning(|_, _| Box::pin(async { Ok(DeleteListingOutcome::NotOwner) }));

        let err = usecase(repo)
            .delete_listing(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ListingError::NotOwner));
    }
}
