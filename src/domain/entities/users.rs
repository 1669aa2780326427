use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::users;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = users)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub is_premium: bool,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Accounts are provisioned by the sign-up flow; the engine only inserts
/// users when seeding test databases.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct InsertUserEntity {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub is_premium: bool,
    pub subscription_expires_at: Option<DateTime<Utc>>,
}

/// Premium flag and expiry always change together.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users, treat_none_as_null = true)]
pub struct UpdateSubscriptionEntity {
    pub is_premium: bool,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
