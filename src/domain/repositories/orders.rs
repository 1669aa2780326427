use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{orders::InsertOrderEntity, rentals::InsertRentalEntity},
    value_objects::{
        checkout::CheckoutInsert,
        enums::order_types::OrderType,
        fulfilment::{FulfilmentStatus, OrderRecord, StatusUpdateOutcome},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum NewFulfilment {
    Sale(InsertOrderEntity),
    Rental(InsertRentalEntity),
}

impl NewFulfilment {
    pub fn listing_id(&self) -> Option<Uuid> {
        match self {
            NewFulfilment::Sale(order) => order.listing_id,
            NewFulfilment::Rental(rental) => rental.listing_id,
        }
    }
}

#[async_trait]
#[automock]
pub trait OrderRepository {
    /// Inserts every row whose listing still exists, in one transaction.
    async fn create_checkout(&self, fulfilments: Vec<NewFulfilment>) -> Result<CheckoutInsert>;

    async fn update_status(
        &self,
        seller_id: Uuid,
        order_type: OrderType,
        order_id: Uuid,
        next: FulfilmentStatus,
        now: DateTime<Utc>,
    ) -> Result<StatusUpdateOutcome>;

    async fn list_for_seller(&self, seller_id: Uuid) -> Result<Vec<OrderRecord>>;

    async fn list_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<OrderRecord>>;
}
