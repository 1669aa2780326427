pub mod listings;
pub mod orders;
pub mod rentals;
pub mod users;
