use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Lifecycle of a rental. `active` may fall back to `pending` when a
/// hand-over is recorded by mistake.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl RentalStatus {
    pub fn allowed_next(&self) -> &'static [RentalStatus] {
        use RentalStatus::*;
        match self {
            Pending => &[Active, Cancelled],
            Active => &[Completed, Pending, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: RentalStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RentalStatus::Completed | RentalStatus::Cancelled)
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(RentalStatus::Pending),
            "active" => Some(RentalStatus::Active),
            "completed" => Some(RentalStatus::Completed),
            "cancelled" => Some(RentalStatus::Cancelled),
            _ => None,
        }
    }
}

impl Display for RentalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            RentalStatus::Pending => "pending",
            RentalStatus::Active => "active",
            RentalStatus::Completed => "completed",
            RentalStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", status)
    }
}
