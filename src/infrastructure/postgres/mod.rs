pub mod migrations;
pub mod postgres_connection;
pub mod repositories;
pub mod schema;
mod transactions;
