use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::listings;

#[derive(Debug, Clone, PartialEq, Serialize, Identifiable, Selectable, Queryable)]
#[diesel(table_name = listings)]
pub struct ListingEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub sale_price_minor: Option<i64>,
    /// Price per rental day.
    pub rental_price_minor: Option<i64>,
    pub is_available: bool,
    pub is_featured: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = listings)]
pub struct InsertListingEntity {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub sale_price_minor: Option<i64>,
    pub rental_price_minor: Option<i64>,
    pub is_available: bool,
    pub is_featured: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = listings)]
pub struct UpdateListingEntity {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sale_price_minor: Option<Option<i64>>,
    pub rental_price_minor: Option<Option<i64>>,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub updated_at: Option<DateTime<Utc>>,
}
