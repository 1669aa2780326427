use std::{collections::HashMap, sync::Arc};

use mockable::Clock;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::usecases::error_kinds::ErrorKind,
    domain::{
        entities::{orders::InsertOrderEntity, rentals::InsertRentalEntity},
        repositories::{
            listings::ListingRepository,
            orders::{NewFulfilment, OrderRepository},
        },
        value_objects::{
            checkout::{
                CheckoutInsert, CheckoutReceipt, CheckoutRequest, PricedItem, PricingError,
                price_item,
            },
            enums::{
                order_statuses::OrderStatus, order_types::OrderType,
                payment_methods::PaymentMethod, rental_statuses::RentalStatus,
            },
        },
    },
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CheckoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::EmptyCart | CheckoutError::Pricing(_) => ErrorKind::Validation,
            CheckoutError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        self.kind().status_code()
    }
}

pub type UseCaseResult<T> = std::result::Result<T, CheckoutError>;

/// Turns a cart into one pending order or rental per line, priced from the
/// catalogue rather than the client.
pub struct CheckoutUseCase<L, O>
where
    L: ListingRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
{
    listing_repo: Arc<L>,
    order_repo: Arc<O>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<L, O> CheckoutUseCase<L, O>
where
    L: ListingRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
{
    pub fn new(
        listing_repo: Arc<L>,
        order_repo: Arc<O>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            listing_repo,
            order_repo,
            clock,
        }
    }

    pub async fn checkout(
        &self,
        buyer_id: Uuid,
        request: CheckoutRequest,
    ) -> UseCaseResult<CheckoutReceipt> {
        info!(
            %buyer_id,
            item_count = request.items.len(),
            payment_method = %request.payment_method,
            "checkout: requested"
        );

        if request.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let listing_ids = request.items.iter().map(|item| item.listing_id).collect();
        let listings: HashMap<Uuid, _> = self
            .listing_repo
            .find_many(listing_ids)
            .await
            .map_err(|err| {
                error!(%buyer_id, db_error = ?err, "checkout: failed to load listings");
                CheckoutError::Internal(err)
            })?
            .into_iter()
            .map(|listing| (listing.id, listing))
            .collect();

        let mut priced = Vec::with_capacity(request.items.len());
        let mut skipped_listing_ids = Vec::new();

        for item in &request.items {
            let Some(listing) = listings.get(&item.listing_id) else {
                warn!(
                    %buyer_id,
                    listing_id = %item.listing_id,
                    "checkout: listing not found, item skipped"
                );
                skipped_listing_ids.push(item.listing_id);
                continue;
            };

            let line = price_item(listing, item).map_err(|err| {
                warn!(
                    %buyer_id,
                    listing_id = %item.listing_id,
                    error = %err,
                    status = ErrorKind::Validation.status_code().as_u16(),
                    "checkout: item failed pricing"
                );
                CheckoutError::Pricing(err)
            })?;
            priced.push(line);
        }

        let now = self.clock.utc();
        let fulfilments: Vec<NewFulfilment> = priced
            .iter()
            .map(|line| to_fulfilment(buyer_id, line, request.payment_method, now))
            .collect();

        let CheckoutInsert {
            orders,
            vanished_listing_ids,
        } = if fulfilments.is_empty() {
            CheckoutInsert::default()
        } else {
            self.order_repo
                .create_checkout(fulfilments)
                .await
                .map_err(|err| {
                    error!(%buyer_id, db_error = ?err, "checkout: failed to create orders");
                    CheckoutError::Internal(err)
                })?
        };

        for listing_id in &vanished_listing_ids {
            warn!(
                %buyer_id,
                %listing_id,
                "checkout: listing deleted before insert, item skipped"
            );
        }
        skipped_listing_ids.extend(vanished_listing_ids);

        info!(
            %buyer_id,
            created_count = orders.len(),
            skipped_count = skipped_listing_ids.len(),
            "checkout: orders created"
        );

        Ok(CheckoutReceipt {
            created_count: orders.len(),
            orders,
            skipped_listing_ids,
        })
    }
}

fn to_fulfilment(
    buyer_id: Uuid,
    line: &PricedItem,
    payment_method: PaymentMethod,
    now: chrono::DateTime<chrono::Utc>,
) -> NewFulfilment {
    match line.order_type {
        OrderType::Sale => NewFulfilment::Sale(InsertOrderEntity {
            listing_id: Some(line.listing_id),
            buyer_id,
            seller_id: line.seller_id,
            quantity: line.quantity,
            unit_price_minor: line.unit_price_minor,
            total_price_minor: line.total_price_minor,
            payment_method: payment_method.to_string(),
            status: OrderStatus::Pending.to_string(),
            created_at: now,
            updated_at: now,
        }),
        OrderType::Rental => NewFulfilment::Rental(InsertRentalEntity {
            listing_id: Some(line.listing_id),
            renter_id: buyer_id,
            owner_id: line.seller_id,
            rental_days: line.rental_days,
            unit_price_minor: line.unit_price_minor,
            total_price_minor: line.total_price_minor,
            payment_method: payment_method.to_string(),
            status: RentalStatus::Pending.to_string(),
            created_at: now,
            updated_at: now,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::usecases::test_support::fixture_clock,
        domain::{
            repositories::{listings::MockListingRepository, orders::MockOrderRepository},
            value_objects::{
                checkout::{CheckoutItem, CreatedOrder},
                listing_lifecycle::tests::listing,
            },
        },
    };

    fn line(listing_id: Uuid, order_type: OrderType, total: i64) -> CheckoutItem {
        CheckoutItem {
            listing_id,
            order_type,
            quantity: 1,
            rental_days: if order_type == OrderType::Rental { 2 } else { 0 },
            client_total_minor: total,
        }
    }

    fn created_from(fulfilments: &[NewFulfilment]) -> CheckoutInsert {
        let orders = fulfilments
            .iter()
            .map(|fulfilment| match fulfilment {
                NewFulfilment::Sale(order) => CreatedOrder {
                    id: Uuid::new_v4(),
                    order_type: OrderType::Sale,
                    listing_id: order.listing_id.unwrap_or_default(),
                    seller_id: order.seller_id,
                    total_price_minor: order.total_price_minor,
                    status: order.status.clone(),
                },
                NewFulfilment::Rental(rental) => CreatedOrder {
                    id: Uuid::new_v4(),
                    order_type: OrderType::Rental,
                    listing_id: rental.listing_id.unwrap_or_default(),
                    seller_id: rental.owner_id,
                    total_price_minor: rental.total_price_minor,
                    status: rental.status.clone(),
                },
            })
            .collect();

        CheckoutInsert {
            orders,
            vanished_listing_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn missing_listing_is_skipped_and_rest_created() {
        let buyer_id = Uuid::new_v4();
        let seller_id = Uuid::new_v4();
        let guitar = listing(seller_id, None);
        let amp = listing(seller_id, None);
        let missing_id = Uuid::new_v4();
        let found = vec![guitar.clone(), amp.clone()];

        let mut listing_repo = MockListingRepository::new();
        listing_repo
            .expect_find_many()
            .withf(move |ids| ids.len() == 3 && ids.contains(&missing_id))
            .returning(move |_| {
                let found = found.clone();
                Box::pin(async move { Ok(found) })
            });

        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_create_checkout()
            .withf(|fulfilments| fulfilments.len() == 2)
            .times(1)
            .returning(|fulfilments| {
                let created = created_from(&fulfilments);
                Box::pin(async move { Ok(created) })
            });

        let usecase =
            CheckoutUseCase::new(Arc::new(listing_repo), Arc::new(order_repo), fixture_clock());
        let receipt = usecase
            .checkout(
                buyer_id,
                CheckoutRequest {
                    items: vec![
                        line(guitar.id, OrderType::Sale, 65_000),
                        line(missing_id, OrderType::Sale, 10_000),
                        line(amp.id, OrderType::Rental, 3_000),
                    ],
                    payment_method: PaymentMethod::Card,
                },
            )
            .await
            .unwrap();

        assert_eq!(receipt.created_count, 2);
        assert_eq!(receipt.skipped_listing_ids, vec![missing_id]);
        assert!(receipt.orders.iter().all(|order| order.status == "pending"));
        assert_eq!(receipt.orders[1].total_price_minor, 3_000);
    }

    #[tokio::test]
    async fn listing_deleted_before_insert_is_skipped() {
        let seller_id = Uuid::new_v4();
        let guitar = listing(seller_id, None);
        let amp = listing(seller_id, None);
        let amp_id = amp.id;
        let found = vec![guitar.clone(), amp.clone()];

        let mut listing_repo = MockListingRepository::new();
        listing_repo.expect_find_many().returning(move |_| {
            let found = found.clone();
            Box::pin(async move { Ok(found) })
        });

        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_create_checkout()
            .times(1)
            .returning(move |fulfilments| {
                let kept: Vec<NewFulfilment> = fulfilments
                    .into_iter()
                    .filter(|fulfilment| fulfilment.listing_id() != Some(amp_id))
                    .collect();
                let mut inserted = created_from(&kept);
                inserted.vanished_listing_ids.push(amp_id);
                Box::pin(async move { Ok(inserted) })
            });

        let usecase =
            CheckoutUseCase::new(Arc::new(listing_repo), Arc::new(order_repo), fixture_clock());
        let receipt = usecase
            .checkout(
                Uuid::new_v4(),
                CheckoutRequest {
                    items: vec![
                        line(guitar.id, OrderType::Sale, 65_000),
                        line(amp.id, OrderType::Sale, 65_000),
                    ],
                    payment_method: PaymentMethod::Card,
                },
            )
            .await
            .unwrap();

        assert_eq!(receipt.created_count, 1);
        assert_eq!(receipt.orders[0].listing_id, guitar.id);
        assert_eq!(receipt.skipped_listing_ids, vec![amp_id]);
    }

    #[tokio::test]
    async fn tampered_total_rejects_the_whole_cart() {
        let seller_id = Uuid::new_v4();
        let guitar = listing(seller_id, None);
        let amp = listing(seller_id, None);
        let found = vec![guitar.clone(), amp.clone()];

        let mut listing_repo = MockListingRepository::new();
        listing_repo.expect_find_many().returning(move |_| {
            let found = found.clone();
            Box::pin(async move { Ok(found) })
        });

        let mut order_repo = MockOrderRepository::new();
        order_repo.expect_create_checkout().never();

        let usecase =
            CheckoutUseCase::new(Arc::new(listing_repo), Arc::new(order_repo), fixture_clock());
        let err = usecase
            .checkout(
                Uuid::new_v4(),
                CheckoutRequest {
                    items: vec![
                        line(guitar.id, OrderType::Sale, 65_000),
                        line(amp.id, OrderType::Sale, 1),
                    ],
                    payment_method: PaymentMethod::Cash,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Pricing(PricingError::TotalMismatch { .. })
        ));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let mut listing_repo = MockListingRepository::new();
        listing_repo.expect_find_many().never();

        let usecase = CheckoutUseCase::new(
            Arc::new(listing_repo),
            Arc::new(MockOrderRepository::new()),
            fixture_clock(),
        );
        let err = usecase
            .checkout(
                Uuid::new_v4(),
                CheckoutRequest {
                    items: Vec::new(),
                    payment_method: PaymentMethod::Card,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn all_missing_creates_nothing() {
        let mut listing_repo = MockListingRepository::new();
        listing_repo
            .expect_find_many()
            .returning(|_| Box::pin(async { Ok(Vec::new()) }));

        let mut order_repo = MockOrderRepository::new();
        order_repo.expect_create_checkout().never();

        let usecase =
            CheckoutUseCase::new(Arc::new(listing_repo), Arc::new(order_repo), fixture_clock());
        let missing_id = Uuid::new_v4();
        let receipt = usecase
            .checkout(
                Uuid::new_v4(),
                CheckoutRequest {
                    items: vec![line(missing_id, OrderType::Sale, 100)],
                    payment_method: PaymentMethod::Card,
                },
            )
            .await
            .unwrap();

        assert_eq!(receipt.created_count, 0);
        assert_eq!(receipt.skipped_listing_ids, vec![missing_id]);
    }
}
