use anyhow::Result;
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::{
    application::usecases::subscriptions::PaymentGateway,
    domain::value_objects::{
        enums::payment_methods::PaymentMethod,
        payments::{PaymentProxy, PaymentReceipt},
    },
};

/// Approves well-formed card details without contacting a processor.
/// Stands in until a real provider is wired up.
#[derive(Debug, Default)]
pub struct StubCardGateway;

impl StubCardGateway {
    pub fn new() -> Self {
        Self
    }

    fn decline(reason: &str) -> PaymentReceipt {
        PaymentReceipt {
            approved: false,
            reference: None,
            decline_reason: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl PaymentGateway for StubCardGateway {
    async fn charge_subscription(
        &self,
        user_id: Uuid,
        amount_minor: i64,
        payment: PaymentProxy,
    ) -> Result<PaymentReceipt> {
        if payment.payment_method != PaymentMethod::Card {
            return Ok(Self::decline("subscriptions are paid by card"));
        }

        let holder_ok = payment
            .card_holder
            .as_deref()
            .is_some_and(|holder| !holder.trim().is_empty());
        let last4_ok = payment
            .card_last4
            .as_deref()
            .is_some_and(|digits| digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()));

        if !holder_ok || !last4_ok {
            return Ok(Self::decline("card details are incomplete"));
        }

        let reference = format!("stub_{}", Uuid::new_v4().simple());
        info!(%user_id, amount_minor, %reference, "payments: stub charge approved");

        Ok(PaymentReceipt {
            approved: true,
            reference: Some(reference),
            decline_reason: None,
        })
    }
}
