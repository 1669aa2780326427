pub mod checkout;
pub mod enums;
pub mod featured_listings;
pub mod fulfilment;
pub mod listing_lifecycle;
pub mod listing_quota;
pub mod listings;
pub mod payments;
pub mod subscription_plans;
