use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::rentals;

#[derive(Debug, Clone, PartialEq, Serialize, Identifiable, Selectable, Queryable)]
#[diesel(table_name = rentals)]
pub struct RentalEntity {
    pub id: Uuid,
    pub listing_id: Option<Uuid>,
    pub renter_id: Uuid,
    pub owner_id: Uuid,
    pub rental_days: i32,
    pub unit_price_minor: i64,
    pub total_price_minor: i64,
    pub payment_method: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = rentals)]
pub struct InsertRentalEntity {
    pub listing_id: Option<Uuid>,
    pub renter_id: Uuid,
    pub owner_id: Uuid,
    pub rental_days: i32,
    pub unit_price_minor: i64,
    pub total_price_minor: i64,
    pub payment_method: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
