use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::usecases::error_kinds::ErrorKind,
    domain::{
        entities::listings::ListingEntity, repositories::listings::ListingRepository,
        value_objects::featured_listings::FeatureToggleOutcome,
    },
};

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("listing not found")]
    NotFound,
    #[error("listing belongs to another seller")]
    NotOwner,
    #[error("featuring listings requires a premium subscription")]
    NotPremium,
    #[error("only active listings can be featured")]
    NotFeaturable,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl FeatureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeatureError::NotFound => ErrorKind::NotFound,
            FeatureError::NotOwner | FeatureError::NotPremium => ErrorKind::Authorization,
            FeatureError::NotFeaturable => ErrorKind::Conflict,
            FeatureError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        self.kind().status_code()
    }
}

pub type UseCaseResult<T> = std::result::Result<T, FeatureError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureToggle {
    pub featured: bool,
    pub listing: ListingEntity,
}

pub struct FeaturedListingUseCase<L>
where
    L: ListingRepository + Send + Sync + 'static,
{
    listing_repo: Arc<L>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<L> FeaturedListingUseCase<L>
where
    L: ListingRepository + Send + Sync + 'static,
{
    pub fn new(listing_repo: Arc<L>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            listing_repo,
            clock,
        }
    }

    /// Features the listing, clearing any other featured listing of the same
    /// seller, or unfeatures it if it already holds the slot.
    pub async fn toggle(&self, requester_id: Uuid, listing_id: Uuid) -> UseCaseResult<FeatureToggle> {
        info!(%requester_id, %listing_id, "featured_listings: toggle requested");

        let now = self.clock.utc();
        let outcome = self
            .listing_repo
            .toggle_featured(listing_id, requester_id, now)
            .await
            .map_err(|err| {
                error!(
                    %requester_id,
                    %listing_id,
                    db_error = ?err,
                    "featured_listings: failed to toggle featured flag"
                );
                FeatureError::Internal(err)
            })?;

        let err = match outcome {
            FeatureToggleOutcome::Featured(listing) => {
                info!(%requester_id, %listing_id, "featured_listings: listing featured");
                return Ok(FeatureToggle {
                    featured: true,
                    listing,
                });
            }
            FeatureToggleOutcome::Unfeatured(listing) => {
                info!(%requester_id, %listing_id, "featured_listings: listing unfeatured");
                return Ok(FeatureToggle {
                    featured: false,
                    listing,
                });
            }
            FeatureToggleOutcome::NotFound => FeatureError::NotFound,
            FeatureToggleOutcome::NotOwner => FeatureError::NotOwner,
            FeatureToggleOutcome::NotPremium => FeatureError::NotPremium,
            FeatureToggleOutcome::NotFeaturable => FeatureError::NotFeaturable,
        };

        warn!(
            %requester_id,
            %listing_id,
            error = %err,
            status = err.status_code().as_u16(),
            "featured_listings: toggle refused"
        );
        Err(err)
    }
}
