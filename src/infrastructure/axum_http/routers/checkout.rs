use std::sync::Arc;

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use mockable::Clock;

use crate::{
    application::usecases::checkout::CheckoutUseCase,
    domain::{
        repositories::{listings::ListingRepository, orders::OrderRepository},
        value_objects::checkout::CheckoutRequest,
    },
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses::AppError},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{listings::ListingPostgres, orders::OrderPostgres},
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, clock: Arc<dyn Clock + Send + Sync>) -> Router {
    let listing_repository = ListingPostgres::new(Arc::clone(&db_pool));
    let order_repository = OrderPostgres::new(Arc::clone(&db_pool));
    let checkout_usecase =
        CheckoutUseCase::new(Arc::new(listing_repository), Arc::new(order_repository), clock);

    router(Arc::new(checkout_usecase))
}

pub fn router<L, O>(checkout_usecase: Arc<CheckoutUseCase<L, O>>) -> Router
where
    L: ListingRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", post(checkout::<L, O>))
        .with_state(checkout_usecase)
}

pub async fn checkout<L, O>(
    State(checkout_usecase): State<Arc<CheckoutUseCase<L, O>>>,
    auth: AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, AppError>
where
    L: ListingRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
{
    let receipt = checkout_usecase.checkout(auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
