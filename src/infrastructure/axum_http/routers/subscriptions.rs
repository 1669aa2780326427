use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use mockable::Clock;

use crate::{
    application::usecases::subscriptions::{PaymentGateway, SubscriptionUseCase},
    domain::{repositories::users::UserRepository, value_objects::payments::PaymentProxy},
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses::AppError},
        payments::stub_card::StubCardGateway,
        postgres::{postgres_connection::PgPoolSquad, repositories::users::UserPostgres},
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, clock: Arc<dyn Clock + Send + Sync>) -> Router {
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let subscriptions_usecase = SubscriptionUseCase::new(
        Arc::new(user_repository),
        Arc::new(StubCardGateway::new()),
        clock,
    );

    router(Arc::new(subscriptions_usecase))
}

pub fn router<U, G>(subscriptions_usecase: Arc<SubscriptionUseCase<U, G>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    Router::new()
        .route("/plans", get(list_plans::<U, G>))
        .route("/current", get(current::<U, G>))
        .route("/upgrade", post(upgrade::<U, G>))
        .route("/downgrade", post(downgrade::<U, G>))
        .with_state(subscriptions_usecase)
}

pub async fn list_plans<U, G>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<U, G>>>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    Json(subscriptions_usecase.list_plans())
}

pub async fn current<U, G>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<U, G>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let snapshot = subscriptions_usecase.resolve(auth.user_id).await?;
    Ok(Json(snapshot))
}

pub async fn upgrade<U, G>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<U, G>>>,
    auth: AuthUser,
    Json(payment): Json<PaymentProxy>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let change = subscriptions_usecase.upgrade(auth.user_id, payment).await?;
    Ok(Json(change))
}

pub async fn downgrade<U, G>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<U, G>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let change = subscriptions_usecase.downgrade(auth.user_id).await?;
    Ok(Json(change))
}
