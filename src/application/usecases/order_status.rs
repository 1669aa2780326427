use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::usecases::error_kinds::ErrorKind,
    domain::{
        repositories::orders::OrderRepository,
        value_objects::{
            enums::order_types::OrderType,
            fulfilment::{FulfilmentStatus, OrderRecord, StatusUpdate, StatusUpdateOutcome},
        },
    },
};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("unknown order type: {0}")]
    InvalidOrderType(String),
    #[error("unknown {order_type} status: {status}")]
    InvalidStatus { order_type: OrderType, status: String },
    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("order not found")]
    NotFound,
    #[error("only the seller can update this order")]
    NotAuthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::InvalidOrderType(_)
            | OrderError::InvalidStatus { .. }
            | OrderError::InvalidTransition { .. } => ErrorKind::Validation,
            OrderError::NotFound => ErrorKind::NotFound,
            OrderError::NotAuthorized => ErrorKind::Authorization,
            OrderError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        self.kind().status_code()
    }
}

pub type UseCaseResult<T> = std::result::Result<T, OrderError>;

/// Seller-driven status changes and the listing visibility they imply.
pub struct OrderStatusUseCase<O>
where
    O: OrderRepository + Send + Sync + 'static,
{
    order_repo: Arc<O>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<O> OrderStatusUseCase<O>
where
    O: OrderRepository + Send + Sync + 'static,
{
    pub fn new(order_repo: Arc<O>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { order_repo, clock }
    }

    pub async fn update_status(
        &self,
        seller_id: Uuid,
        order_type: &str,
        order_id: Uuid,
        status: &str,
    ) -> UseCaseResult<StatusUpdate> {
        let order_type = OrderType::from_str(order_type)
            .ok_or_else(|| OrderError::InvalidOrderType(order_type.to_string()))?;
        let next = FulfilmentStatus::parse(order_type, status).ok_or_else(|| {
            OrderError::InvalidStatus {
                order_type,
                status: status.to_string(),
            }
        })?;

        info!(
            %seller_id,
            %order_id,
            %order_type,
            next_status = %next,
            "order_status: update requested"
        );

        let now = self.clock.utc();
        let outcome = self
            .order_repo
            .update_status(seller_id, order_type, order_id, next, now)
            .await
            .map_err(|err| {
                error!(
                    %seller_id,
                    %order_id,
                    db_error = ?err,
                    "order_status: failed to update status"
                );
                OrderError::Internal(err)
            })?;

        let err = match outcome {
            StatusUpdateOutcome::Updated(update) => {
                info!(
                    %seller_id,
                    %order_id,
                    status = update.order.status(),
                    listing_available = ?update.listing_available,
                    listing_sold = update.listing_sold,
                    "order_status: status updated"
                );
                return Ok(update);
            }
            StatusUpdateOutcome::NotFound => OrderError::NotFound,
            StatusUpdateOutcome::NotAuthorized => OrderError::NotAuthorized,
            StatusUpdateOutcome::InvalidTransition { from, to } => {
                OrderError::InvalidTransition { from, to }
            }
        };

        warn!(
            %seller_id,
            %order_id,
            error = %err,
            status = err.status_code().as_u16(),
            "order_status: update refused"
        );
        Err(err)
    }

    pub async fn list_selling(&self, seller_id: Uuid) -> UseCaseResult<Vec<OrderRecord>> {
        self.order_repo
            .list_for_seller(seller_id)
            .await
            .map_err(|err| {
                error!(%seller_id, db_error = ?err, "order_status: failed to list seller orders");
                OrderError::Internal(err)
            })
    }

    pub async fn list_buying(&self, buyer_id: Uuid) -> UseCaseResult<Vec<OrderRecord>> {
        self.order_repo
            .list_for_buyer(buyer_id)
            .await
            .map_err(|err| {
                error!(%buyer_id, db_error = ?err, "order_status: failed to list buyer orders");
                OrderError::Internal(err)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::usecases::test_support::{fixture_clock, fixture_now},
        domain::{
            entities::orders::OrderEntity,
            repositories::orders::MockOrderRepository,
            value_objects::enums::{order_statuses::OrderStatus, rental_statuses::RentalStatus},
        },
    };
    use mockall::predicate::eq;

    fn usecase(repo: MockOrderRepository) -> OrderStatusUseCase<MockOrderRepository> {
        OrderStatusUseCase::new(Arc::new(repo), fixture_clock())
    }

    fn sale_order(seller_id: Uuid, status: OrderStatus) -> OrderEntity {
        OrderEntity {
            id: Uuid::new_v4(),
            listing_id: Some(Uuid::new_v4()),
            buyer_id: Uuid::new_v4(),
            seller_id,
            quantity: 1,
            unit_price_minor: 65_000,
            total_price_minor: 65_000,
            payment_method: "card".to_string(),
            status: status.to_string(),
            created_at: fixture_now(),
            updated_at: fixture_now(),
        }
    }

    #[tokio::test]
    async fn completing_sale_reports_sold_listing() {
        let seller_id = Uuid::new_v4();
        let order = sale_order(seller_id, OrderStatus::Completed);
        let order_id = order.id;
        let mut repo = MockOrderRepository::new();

        repo.expect_update_status()
            .with(
                eq(seller_id),
                eq(OrderType::Sale),
                eq(order_id),
                eq(FulfilmentStatus::Sale(OrderStatus::Completed)),
                eq(fixture_now()),
            )
            .times(1)
            .returning(move |_, _, _, _, _| {
                let order = order.clone();
                Box::pin(async move {
                    Ok(StatusUpdateOutcome::Updated(StatusUpdate {
                        order: OrderRecord::Sale(order),
                        listing_available: Some(false),
                        listing_sold: true,
                    }))
                })
            });

        let update = usecase(repo)
            .update_status(seller_id, "sale", order_id, "completed")
            .await
            .unwrap();
        assert!(update.listing_sold);
        assert_eq!(update.listing_available, Some(false));
    }

    #[tokio::test]
    async fn rental_statuses_parse_against_rental_machine() {
        let mut repo = MockOrderRepository::new();
        repo.expect_update_status()
            .withf(|_, order_type, _, next, _| {
                *order_type == OrderType::Rental
                    && *next == FulfilmentStatus::Rental(RentalStatus::Active)
            })
            .returning(|_, _, _, _, _| Box::pin(async { Ok(StatusUpdateOutcome::NotFound) }));

        let err = usecase(repo)
            .update_status(Uuid::new_v4(), "rental", Uuid::new_v4(), "active")
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotFound));
    }

    #[tokio::test]
    async fn sale_status_on_rental_is_rejected_before_storage() {
        let mut repo = MockOrderRepository::new();
        repo.expect_update_status().never();

        let err = usecase(repo)
            .update_status(Uuid::new_v4(), "rental", Uuid::new_v4(), "shipped")
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidStatus { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn unknown_order_type_is_rejected() {
        let mut repo = MockOrderRepository::new();
        repo.expect_update_status().never();

        let err = usecase(repo)
            .update_status(Uuid::new_v4(), "lease", Uuid::new_v4(), "pending")
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidOrderType(value) if value == "lease"));
    }

    #[tokio::test]
    async fn transition_out_of_terminal_state_is_invalid() {
        let mut repo = MockOrderRepository::new();
        repo.expect_update_status().returning(|_, _, _, _, _| {
            Box::pin(async {
                Ok(StatusUpdateOutcome::InvalidTransition {
                    from: "completed".to_string(),
                    to: "pending".to_string(),
                })
            })
        });

        let err = usecase(repo)
            .update_status(Uuid::new_v4(), "sale", Uuid::new_v4(), "pending")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot move from completed to pending");
    }

    #[tokio::test]
    async fn buyer_cannot_update_status() {
        let mut repo = MockOrderRepository::new();
        repo.expect_update_status()
            .returning(|_, _, _, _, _| Box::pin(async { Ok(StatusUpdateOutcome::NotAuthorized) }));

        let err = usecase(repo)
            .update_status(Uuid::new_v4(), "sale", Uuid::new_v4(), "processing")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn seller_orders_are_listed() {
        let seller_id = Uuid::new_v4();
        let order = sale_order(seller_id, OrderStatus::Pending);
        let mut repo = MockOrderRepository::new();

        repo.expect_list_for_seller()
            .with(eq(seller_id))
            .returning(move |_| {
                let order = order.clone();
                Box::pin(async move { Ok(vec![OrderRecord::Sale(order)]) })
            });

        let orders = usecase(repo).list_selling(seller_id).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status(), "pending");
    }
}
