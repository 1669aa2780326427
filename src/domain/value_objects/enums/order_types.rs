use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Sale orders and time-boxed rentals are stored in separate tables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Sale,
    Rental,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Sale => "sale",
            OrderType::Rental => "rental",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "sale" => Some(OrderType::Sale),
            "rental" => Some(OrderType::Rental),
            _ => None,
        }
    }
}

impl Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
