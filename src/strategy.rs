use crate::domain::method::{PaymentMethod, PaymentMethodType};
use crate::domain::order::OrderSnapshot;
use crate::error::PaymentError;
use crate::gateway::{fields, PaymentGateway, PaymentRedirect, RefundOutcome};
use std::collections::HashMap;
use std::sync::Arc;

pub const CLIENT_BANK_CODE: &str = "bank_code";

pub struct CreditCardStrategy {
    pub gateway: Arc<dyn PaymentGateway>,
}

pub struct DomesticCardStrategy {
    pub gateway: Arc<dyn PaymentGateway>,
}

pub enum PaymentStrategy {
    CreditCard(CreditCardStrategy),
    DomesticCard(DomesticCardStrategy),
}

impl std::fmt::Debug for PaymentStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStrategy::CreditCard(_) => f.write_str("PaymentStrategy::CreditCard"),
            PaymentStrategy::DomesticCard(_) => f.write_str("PaymentStrategy::DomesticCard"),
        }
    }
}

impl PaymentStrategy {
    pub fn for_method(
        method_type: PaymentMethodType,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Result<Self, PaymentError> {
        match method_type {
            PaymentMethodType::CreditCard => Ok(Self::CreditCard(CreditCardStrategy { gateway })),
            PaymentMethodType::DomesticDebitCard => Ok(Self::DomesticCard(DomesticCardStrategy { gateway })),
            PaymentMethodType::BankTransfer => Err(PaymentError::Configuration(
                "no payment strategy is registered for BANK_TRANSFER".to_string(),
            )),
        }
    }

    pub fn process_payment(
        &self,
        order: &OrderSnapshot,
        method: &PaymentMethod,
        client_params: &HashMap<String, String>,
    ) -> Result<PaymentRedirect, PaymentError> {
        match self {
            Self::CreditCard(s) => s.process_payment(order, method),
            Self::DomesticCard(s) => s.process_payment(order, method, client_params),
        }
    }

    pub async fn process_refund(
        &self,
        original_txn_ref: &str,
        order: &OrderSnapshot,
        amount: i64,
        reason: &str,
    ) -> Result<RefundOutcome, PaymentError> {
        let gateway = match self {
            Self::CreditCard(s) => &s.gateway,
            Self::DomesticCard(s) => &s.gateway,
        };
        let params = gateway.prepare_refund_parameters(order, original_txn_ref, amount, reason)?;
        gateway.submit_refund(params).await
    }
}

impl CreditCardStrategy {
    fn process_payment(&self, order: &OrderSnapshot, method: &PaymentMethod) -> Result<PaymentRedirect, PaymentError> {
        let mut params = self
            .gateway
            .prepare_payment_parameters(order, method, method.card.as_ref())?;
        params.insert(fields::BANK_CODE.to_string(), fields::INTERNATIONAL_CARD_CODE.to_string());
        self.gateway.build_redirect(&params)
    }
}

impl DomesticCardStrategy {
    fn process_payment(
        &self,
        order: &OrderSnapshot,
        method: &PaymentMethod,
        client_params: &HashMap<String, String>,
    ) -> Result<PaymentRedirect, PaymentError> {
        let bank_code = client_params
            .get(CLIENT_BANK_CODE)
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .ok_or_else(|| {
                PaymentError::Validation("domestic card payments require a non-empty bank_code".to_string())
            })?
            .to_string();

        let mut params = self
            .gateway
            .prepare_payment_parameters(order, method, method.card.as_ref())?;
        params.insert(fields::BANK_CODE.to_string(), bank_code);
        self.gateway.build_redirect(&params)
    }
}
