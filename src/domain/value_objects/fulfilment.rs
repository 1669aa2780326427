use serde::Serialize;

use crate::domain::{
    entities::{orders::OrderEntity, rentals::RentalEntity},
    value_objects::enums::{
        order_statuses::OrderStatus, order_types::OrderType, rental_statuses::RentalStatus,
    },
};

/// What a status write does to the referenced listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingVisibility {
    Show,
    Hide,
}

/// A status of either order type, so both state machines share one
/// propagation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfilmentStatus {
    Sale(OrderStatus),
    Rental(RentalStatus),
}

impl FulfilmentStatus {
    pub fn parse(order_type: OrderType, value: &str) -> Option<Self> {
        match order_type {
            OrderType::Sale => OrderStatus::from_str(value).map(FulfilmentStatus::Sale),
            OrderType::Rental => RentalStatus::from_str(value).map(FulfilmentStatus::Rental),
        }
    }

    pub fn order_type(&self) -> OrderType {
        match self {
            FulfilmentStatus::Sale(_) => OrderType::Sale,
            FulfilmentStatus::Rental(_) => OrderType::Rental,
        }
    }

    pub fn visibility(&self) -> ListingVisibility {
        match self {
            FulfilmentStatus::Sale(OrderStatus::Pending | OrderStatus::Cancelled)
            | FulfilmentStatus::Rental(RentalStatus::Pending | RentalStatus::Cancelled) => {
                ListingVisibility::Show
            }
            FulfilmentStatus::Sale(
                OrderStatus::Processing | OrderStatus::Shipped | OrderStatus::Completed,
            )
            | FulfilmentStatus::Rental(RentalStatus::Active | RentalStatus::Completed) => {
                ListingVisibility::Hide
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            FulfilmentStatus::Sale(OrderStatus::Completed)
                | FulfilmentStatus::Rental(RentalStatus::Completed)
        )
    }

    /// Mismatched order types never transition into each other.
    pub fn can_transition_to(&self, next: FulfilmentStatus) -> bool {
        match (self, next) {
            (FulfilmentStatus::Sale(current), FulfilmentStatus::Sale(next)) => {
                current.can_transition_to(next)
            }
            (FulfilmentStatus::Rental(current), FulfilmentStatus::Rental(next)) => {
                current.can_transition_to(next)
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for FulfilmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfilmentStatus::Sale(status) => write!(f, "{}", status),
            FulfilmentStatus::Rental(status) => write!(f, "{}", status),
        }
    }
}

/// Availability of a listing after a status write. A sold listing stays
/// hidden whatever the new status is.
pub fn availability_after(visibility: ListingVisibility, is_sold: bool) -> bool {
    match visibility {
        ListingVisibility::Hide => false,
        ListingVisibility::Show => !is_sold,
    }
}

/// A sale order or a rental, as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "order_type", rename_all = "snake_case")]
pub enum OrderRecord {
    Sale(OrderEntity),
    Rental(RentalEntity),
}

impl OrderRecord {
    pub fn id(&self) -> uuid::Uuid {
        match self {
            OrderRecord::Sale(order) => order.id,
            OrderRecord::Rental(rental) => rental.id,
        }
    }

    pub fn status(&self) -> &str {
        match self {
            OrderRecord::Sale(order) => &order.status,
            OrderRecord::Rental(rental) => &rental.status,
        }
    }

    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        match self {
            OrderRecord::Sale(order) => order.created_at,
            OrderRecord::Rental(rental) => rental.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub order: OrderRecord,
    /// New availability of the referenced listing, absent if it was deleted.
    pub listing_available: Option<bool>,
    pub listing_sold: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdateOutcome {
    Updated(StatusUpdate),
    NotFound,
    NotAuthorized,
    InvalidTransition { from: String, to: String },
}
