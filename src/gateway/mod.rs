use crate::domain::method::{CardDetails, PaymentMethod};
use crate::domain::order::OrderSnapshot;
use crate::error::PaymentError;
use std::collections::HashMap;

pub mod fields;
pub mod mock;
pub mod signing;
pub mod vnpay;

#[derive(Debug, Clone)]
pub struct PaymentRedirect {
    pub payment_url: String,
    pub txn_ref: String,
}

#[derive(Debug, Clone)]
pub struct RefundOutcome {
    pub request_ref: String,
    pub response_code: String,
    pub transaction_no: Option<String>,
    pub raw_payload: String,
}

#[derive(Debug, Clone)]
pub struct StatusOutcome {
    pub txn_ref: String,
    pub response_code: String,
    pub transaction_no: Option<String>,
    pub raw_payload: String,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    fn prepare_payment_parameters(
        &self,
        order: &OrderSnapshot,
        method: &PaymentMethod,
        card: Option<&CardDetails>,
    ) -> Result<HashMap<String, String>, PaymentError>;

    fn build_redirect(&self, params: &HashMap<String, String>) -> Result<PaymentRedirect, PaymentError>;

    fn validate_response_signature(&self, params: &HashMap<String, String>) -> bool;

    fn prepare_refund_parameters(
        &self,
        order: &OrderSnapshot,
        original_txn_ref: &str,
        refund_amount: i64,
        reason: &str,
    ) -> Result<HashMap<String, String>, PaymentError>;

    async fn submit_refund(&self, params: HashMap<String, String>) -> Result<RefundOutcome, PaymentError>;

    async fn query_transaction_status(
        &self,
        txn_ref: &str,
        order_id: &str,
        txn_date: &str,
    ) -> Result<StatusOutcome, PaymentError>;
}
