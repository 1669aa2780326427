use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::{orders::OrderEntity, rentals::RentalEntity},
        repositories::orders::{NewFulfilment, OrderRepository},
        value_objects::{
            checkout::{CheckoutInsert, CreatedOrder},
            enums::{
                order_statuses::OrderStatus, order_types::OrderType, rental_statuses::RentalStatus,
            },
            fulfilment::{
                FulfilmentStatus, OrderRecord, StatusUpdate, StatusUpdateOutcome,
                availability_after,
            },
        },
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{listings, orders, rentals},
        transactions::{is_listing_sold, lock_listing},
    },
};

pub struct OrderPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl OrderPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// The locked row of either table, reduced to what the state machine needs.
struct LockedFulfilment {
    owner_id: Uuid,
    listing_id: Option<Uuid>,
    status: String,
}

fn lock_fulfilment(
    conn: &mut PgConnection,
    order_type: OrderType,
    order_id: Uuid,
) -> QueryResult<Option<LockedFulfilment>> {
    match order_type {
        OrderType::Sale => Ok(orders::table
            .find(order_id)
            .select(OrderEntity::as_select())
            .for_update()
            .first::<OrderEntity>(conn)
            .optional()?
            .map(|order| LockedFulfilment {
                owner_id: order.seller_id,
                listing_id: order.listing_id,
                status: order.status,
            })),
        OrderType::Rental => Ok(rentals::table
            .find(order_id)
            .select(RentalEntity::as_select())
            .for_update()
            .first::<RentalEntity>(conn)
            .optional()?
            .map(|rental| LockedFulfilment {
                owner_id: rental.owner_id,
                listing_id: rental.listing_id,
                status: rental.status,
            })),
    }
}

fn write_status(
    conn: &mut PgConnection,
    order_id: Uuid,
    next: FulfilmentStatus,
    now: DateTime<Utc>,
) -> QueryResult<OrderRecord> {
    match next {
        FulfilmentStatus::Sale(status) => update(orders::table.find(order_id))
            .set((
                orders::status.eq(status.to_string()),
                orders::updated_at.eq(now),
            ))
            .returning(OrderEntity::as_returning())
            .get_result(conn)
            .map(OrderRecord::Sale),
        FulfilmentStatus::Rental(status) => update(rentals::table.find(order_id))
            .set((
                rentals::status.eq(status.to_string()),
                rentals::updated_at.eq(now),
            ))
            .returning(RentalEntity::as_returning())
            .get_result(conn)
            .map(OrderRecord::Rental),
    }
}

/// Applies the visibility implied by `next` to the referenced listing. The
/// sold check runs after the status write so a completion in this
/// transaction counts.
fn propagate_to_listing(
    conn: &mut PgConnection,
    listing_id: Option<Uuid>,
    next: FulfilmentStatus,
    now: DateTime<Utc>,
) -> QueryResult<(Option<bool>, bool)> {
    let Some(listing_id) = listing_id else {
        return Ok((None, false));
    };
    if lock_listing(conn, listing_id)?.is_none() {
        return Ok((None, false));
    }

    let is_sold = is_listing_sold(conn, listing_id)?;
    let is_available = availability_after(next.visibility(), is_sold);

    if is_sold {
        update(listings::table.find(listing_id))
            .set((
                listings::is_available.eq(false),
                listings::is_featured.eq(false),
                listings::updated_at.eq(now),
            ))
            .execute(conn)?;
    } else {
        update(listings::table.find(listing_id))
            .set((
                listings::is_available.eq(is_available),
                listings::updated_at.eq(now),
            ))
            .execute(conn)?;
    }

    Ok((Some(is_available), is_sold))
}

fn current_status(order_type: OrderType, status: &str) -> Result<FulfilmentStatus> {
    FulfilmentStatus::parse(order_type, status)
        .ok_or_else(|| anyhow!("stored {order_type} status {status:?} is not recognised"))
}

#[async_trait]
impl OrderRepository for OrderPostgres {
    async fn create_checkout(&self, fulfilments: Vec<NewFulfilment>) -> Result<CheckoutInsert> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = conn.transaction::<_, diesel::result::Error, _>(|tx| {
            let mut inserted = CheckoutInsert {
                orders: Vec::with_capacity(fulfilments.len()),
                vanished_listing_ids: Vec::new(),
            };

            for fulfilment in &fulfilments {
                // The row lock keeps a concurrent delete out until commit.
                if let Some(listing_id) = fulfilment.listing_id() {
                    if lock_listing(tx, listing_id)?.is_none() {
                        inserted.vanished_listing_ids.push(listing_id);
                        continue;
                    }
                }

                let row = match fulfilment {
                    NewFulfilment::Sale(order) => {
                        let order = insert_into(orders::table)
                            .values(order)
                            .returning(OrderEntity::as_returning())
                            .get_result::<OrderEntity>(tx)?;
                        CreatedOrder {
                            id: order.id,
                            order_type: OrderType::Sale,
                            listing_id: order.listing_id.unwrap_or_default(),
                            seller_id: order.seller_id,
                            total_price_minor: order.total_price_minor,
                            status: order.status,
                        }
                    }
                    NewFulfilment::Rental(rental) => {
                        let rental = insert_into(rentals::table)
                            .values(rental)
                            .returning(RentalEntity::as_returning())
                            .get_result::<RentalEntity>(tx)?;
                        CreatedOrder {
                            id: rental.id,
                            order_type: OrderType::Rental,
                            listing_id: rental.listing_id.unwrap_or_default(),
                            seller_id: rental.owner_id,
                            total_price_minor: rental.total_price_minor,
                            status: rental.status,
                        }
                    }
                };
                inserted.orders.push(row);
            }

            Ok(inserted)
        })?;

        Ok(inserted)
    }

    async fn update_status(
        &self,
        seller_id: Uuid,
        order_type: OrderType,
        order_id: Uuid,
        next: FulfilmentStatus,
        now: DateTime<Utc>,
    ) -> Result<StatusUpdateOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<_, anyhow::Error, _>(|tx| {
            let Some(locked) = lock_fulfilment(tx, order_type, order_id)? else {
                return Ok(StatusUpdateOutcome::NotFound);
            };
            if locked.owner_id != seller_id {
                return Ok(StatusUpdateOutcome::NotAuthorized);
            }

            let current = current_status(order_type, &locked.status)?;
            if !current.can_transition_to(next) {
                return Ok(StatusUpdateOutcome::InvalidTransition {
                    from: current.to_string(),
                    to: next.to_string(),
                });
            }

            let order = write_status(tx, order_id, next, now)?;
            let (listing_available, listing_sold) =
                propagate_to_listing(tx, locked.listing_id, next, now)?;

            Ok(StatusUpdateOutcome::Updated(StatusUpdate {
                order,
                listing_available,
                listing_sold,
            }))
        })?;

        Ok(outcome)
    }

    async fn list_for_seller(&self, seller_id: Uuid) -> Result<Vec<OrderRecord>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let sales = orders::table
            .filter(orders::seller_id.eq(seller_id))
            .select(OrderEntity::as_select())
            .load::<OrderEntity>(&mut conn)?;
        let rentals = rentals::table
            .filter(rentals::owner_id.eq(seller_id))
            .select(RentalEntity::as_select())
            .load::<RentalEntity>(&mut conn)?;

        Ok(merge_newest_first(sales, rentals))
    }

    async fn list_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<OrderRecord>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let sales = orders::table
            .filter(orders::buyer_id.eq(buyer_id))
            .select(OrderEntity::as_select())
            .load::<OrderEntity>(&mut conn)?;
        let rentals = rentals::table
            .filter(rentals::renter_id.eq(buyer_id))
            .select(RentalEntity::as_select())
            .load::<RentalEntity>(&mut conn)?;

        Ok(merge_newest_first(sales, rentals))
    }
}

fn merge_newest_first(sales: Vec<OrderEntity>, rentals: Vec<RentalEntity>) -> Vec<OrderRecord> {
    let mut records: Vec<OrderRecord> = sales
        .into_iter()
        .map(OrderRecord::Sale)
        .chain(rentals.into_iter().map(OrderRecord::Rental))
        .collect();
    records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    records
}
