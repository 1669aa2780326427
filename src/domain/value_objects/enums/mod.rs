pub mod order_statuses;
pub mod order_types;
pub mod payment_methods;
pub mod rental_statuses;
pub mod subscription_tiers;
