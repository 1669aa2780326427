use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch},
};
use mockable::Clock;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    application::usecases::order_status::OrderStatusUseCase,
    domain::repositories::orders::OrderRepository,
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses::AppError},
        postgres::{postgres_connection::PgPoolSquad, repositories::orders::OrderPostgres},
    },
};

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, clock: Arc<dyn Clock + Send + Sync>) -> Router {
    let order_repository = OrderPostgres::new(Arc::clone(&db_pool));
    let order_status_usecase = OrderStatusUseCase::new(Arc::new(order_repository), clock);

    router(Arc::new(order_status_usecase))
}

pub fn router<O>(order_status_usecase: Arc<OrderStatusUseCase<O>>) -> Router
where
    O: OrderRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/selling", get(list_selling::<O>))
        .route("/buying", get(list_buying::<O>))
        .route("/:order_type/:id/status", patch(update_status::<O>))
        .with_state(order_status_usecase)
}

pub async fn list_selling<O>(
    State(order_status_usecase): State<Arc<OrderStatusUseCase<O>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    O: OrderRepository + Send + Sync + 'static,
{
    let orders = order_status_usecase.list_selling(auth.user_id).await?;
    Ok(Json(orders))
}

pub async fn list_buying<O>(
    State(order_status_usecase): State<Arc<OrderStatusUseCase<O>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    O: OrderRepository + Send + Sync + 'static,
{
    let orders = order_status_usecase.list_buying(auth.user_id).await?;
    Ok(Json(orders))
}

pub async fn update_status<O>(
    State(order_status_usecase): State<Arc<OrderStatusUseCase<O>>>,
    auth: AuthUser,
    Path((order_type, order_id)): Path<(String, Uuid)>,
    Json(change): Json<StatusChange>,
) -> Result<impl IntoResponse, AppError>
where
    O: OrderRepository + Send + Sync + 'static,
{
    let update = order_status_usecase
        .update_status(auth.user_id, &order_type, order_id, &change.status)
        .await?;
    Ok(Json(update))
}
