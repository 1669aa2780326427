use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    entities::listings::ListingEntity,
    value_objects::enums::{order_types::OrderType, payment_methods::PaymentMethod},
};

/// Largest accepted gap, in minor units, between the submitted total and the
/// catalogue price.
pub const PRICE_TOLERANCE_MINOR: u64 = 1;

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub listing_id: Uuid,
    pub order_type: OrderType,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub rental_days: i32,
    pub client_total_minor: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    pub payment_method: PaymentMethod,
}

/// A cart line priced from the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
    pub listing_id: Uuid,
    pub seller_id: Uuid,
    pub order_type: OrderType,
    pub quantity: i32,
    pub rental_days: i32,
    pub unit_price_minor: i64,
    pub total_price_minor: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("listing {listing_id} is not offered for {order_type}")]
    NotOffered {
        listing_id: Uuid,
        order_type: OrderType,
    },
    #[error("quantity must be at least 1 for listing {0}")]
    InvalidQuantity(Uuid),
    #[error("rentals are booked one unit at a time for listing {0}")]
    RentalQuantity(Uuid),
    #[error("rental days must be at least 1 for listing {0}")]
    InvalidRentalDays(Uuid),
    #[error("total for listing {listing_id} does not match: expected {expected_minor}, got {submitted_minor}")]
    TotalMismatch {
        listing_id: Uuid,
        expected_minor: i64,
        submitted_minor: i64,
    },
    #[error("price overflow for listing {0}")]
    Overflow(Uuid),
}

/// Prices one cart line from the listing's stored price and checks the
/// client's total against it.
pub fn price_item(listing: &ListingEntity, item: &CheckoutItem) -> Result<PricedItem, PricingError> {
    let (unit_price_minor, multiplier) = match item.order_type {
        OrderType::Sale => {
            if item.quantity < 1 {
                return Err(PricingError::InvalidQuantity(listing.id));
            }
            let unit = listing.sale_price_minor.ok_or(PricingError::NotOffered {
                listing_id: listing.id,
                order_type: item.order_type,
            })?;
            (unit, item.quantity)
        }
        OrderType::Rental => {
            if item.quantity != 1 {
                return Err(PricingError::RentalQuantity(listing.id));
            }
            if item.rental_days < 1 {
                return Err(PricingError::InvalidRentalDays(listing.id));
            }
            let unit = listing.rental_price_minor.ok_or(PricingError::NotOffered {
                listing_id: listing.id,
                order_type: item.order_type,
            })?;
            (unit, item.rental_days)
        }
    };

    let expected_minor = unit_price_minor
        .checked_mul(i64::from(multiplier))
        .ok_or(PricingError::Overflow(listing.id))?;

    if expected_minor.abs_diff(item.client_total_minor) > PRICE_TOLERANCE_MINOR {
        return Err(PricingError::TotalMismatch {
            listing_id: listing.id,
            expected_minor,
            submitted_minor: item.client_total_minor,
        });
    }

    Ok(PricedItem {
        listing_id: listing.id,
        seller_id: listing.owner_id,
        order_type: item.order_type,
        quantity: item.quantity,
        rental_days: item.rental_days,
        unit_price_minor,
        total_price_minor: expected_minor,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedOrder {
    pub id: Uuid,
    pub order_type: OrderType,
    pub listing_id: Uuid,
    pub seller_id: Uuid,
    pub total_price_minor: i64,
    pub status: String,
}

/// What the store wrote for a cart. Lines whose listing disappeared before
/// the insert transaction locked it are reported instead of inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutInsert {
    pub orders: Vec<CreatedOrder>,
    pub vanished_listing_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    pub created_count: usize,
    pub orders: Vec<CreatedOrder>,
    pub skipped_listing_ids: Vec<Uuid>,
}
