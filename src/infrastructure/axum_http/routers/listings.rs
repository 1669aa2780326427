use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use mockable::Clock;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    application::usecases::{
        featured_listings::FeaturedListingUseCase,
        listings::{ListingCreation, ListingUseCase},
    },
    domain::{
        repositories::listings::ListingRepository,
        value_objects::listings::{NewListingModel, UpdateListingModel},
    },
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses::AppError},
        postgres::{postgres_connection::PgPoolSquad, repositories::listings::ListingPostgres},
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    pub limit: Option<i64>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, clock: Arc<dyn Clock + Send + Sync>) -> Router {
    let listing_repository = Arc::new(ListingPostgres::new(Arc::clone(&db_pool)));
    let listing_usecase = ListingUseCase::new(Arc::clone(&listing_repository), Arc::clone(&clock));
    let featured_usecase = FeaturedListingUseCase::new(listing_repository, clock);

    router(Arc::new(listing_usecase), Arc::new(featured_usecase))
}

pub fn router<L>(
    listing_usecase: Arc<ListingUseCase<L>>,
    featured_usecase: Arc<FeaturedListingUseCase<L>>,
) -> Router
where
    L: ListingRepository + Send + Sync + 'static,
{
    let featured = Router::new()
        .route("/:id/feature", post(toggle_featured::<L>))
        .with_state(featured_usecase);

    Router::new()
        .route("/", get(browse::<L>).post(create::<L>))
        .route("/mine", get(list_mine::<L>))
        .route(
            "/:id",
            get(get_listing::<L>)
                .patch(update::<L>)
                .delete(delete_listing::<L>),
        )
        .route("/:id/renew", post(renew::<L>))
        .with_state(listing_usecase)
        .merge(featured)
}

pub async fn create<L>(
    State(listing_usecase): State<Arc<ListingUseCase<L>>>,
    auth: AuthUser,
    Json(new_listing): Json<NewListingModel>,
) -> Result<Response, AppError>
where
    L: ListingRepository + Send + Sync + 'static,
{
    match listing_usecase
        .create_listing(auth.user_id, new_listing)
        .await?
    {
        ListingCreation::Created { listing } => {
            Ok((StatusCode::CREATED, Json(listing)).into_response())
        }
        ListingCreation::QuotaExceeded(exceeded) => {
            Ok(AppError::quota_exceeded(exceeded).into_response())
        }
    }
}

pub async fn browse<L>(
    State(listing_usecase): State<Arc<ListingUseCase<L>>>,
    Query(query): Query<BrowseQuery>,
) -> Result<impl IntoResponse, AppError>
where
    L: ListingRepository + Send + Sync + 'static,
{
    let listings = listing_usecase.browse(query.limit).await?;
    Ok(Json(listings))
}

pub async fn list_mine<L>(
    State(listing_usecase): State<Arc<ListingUseCase<L>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    L: ListingRepository + Send + Sync + 'static,
{
    let listings = listing_usecase.list_my_listings(auth.user_id).await?;
    Ok(Json(listings))
}

pub async fn get_listing<L>(
    State(listing_usecase): State<Arc<ListingUseCase<L>>>,
    Path(listing_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    L: ListingRepository + Send + Sync + 'static,
{
    let listing = listing_usecase.get_listing(listing_id).await?;
    Ok(Json(listing))
}

pub async fn update<L>(
    State(listing_usecase): State<Arc<ListingUseCase<L>>>,
    auth: AuthUser,
    Path(listing_id): Path<Uuid>,
    Json(changes): Json<UpdateListingModel>,
) -> Result<impl IntoResponse, AppError>
where
    L: ListingRepository + Send + Sync + 'static,
{
    let listing = listing_usecase
        .update_listing(auth.user_id, listing_id, changes)
        .await?;
    Ok(Json(listing))
}

pub async fn delete_listing<L>(
    State(listing_usecase): State<Arc<ListingUseCase<L>>>,
    auth: AuthUser,
    Path(listing_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    L: ListingRepository + Send + Sync + 'static,
{
    listing_usecase
        .delete_listing(auth.user_id, listing_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn renew<L>(
    State(listing_usecase): State<Arc<ListingUseCase<L>>>,
    auth: AuthUser,
    Path(listing_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    L: ListingRepository + Send + Sync + 'static,
{
    let listing = listing_usecase.renew_listing(auth.user_id, listing_id).await?;
    Ok(Json(listing))
}

pub async fn toggle_featured<L>(
    State(featured_usecase): State<Arc<FeaturedListingUseCase<L>>>,
    auth: AuthUser,
    Path(listing_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    L: ListingRepository + Send + Sync + 'static,
{
    let toggle = featured_usecase.toggle(auth.user_id, listing_id).await?;
    Ok(Json(toggle))
}
