use serde::{Deserialize, Serialize};

use crate::domain::value_objects::enums::payment_methods::PaymentMethod;

/// Payment fields forwarded to the gateway. Their format is the gateway's
/// concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProxy {
    pub payment_method: PaymentMethod,
    pub card_holder: Option<String>,
    pub card_last4: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub approved: bool,
    pub reference: Option<String>,
    pub decline_reason: Option<String>,
}
