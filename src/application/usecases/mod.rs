pub mod checkout;
pub mod error_kinds;
pub mod featured_listings;
pub mod listings;
pub mod order_status;
pub mod subscriptions;

#[cfg(test)]
pub(crate) mod test_support;
