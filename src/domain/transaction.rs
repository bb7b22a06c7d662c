use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Payment,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    PendingUserAction,
    Success,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::PendingUserAction)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub transaction_id: Uuid,
    pub external_ref: String,
    pub order_id: String,
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub gateway_transaction_no: Option<String>,
    pub raw_gateway_payload: Option<String>,
    pub payment_method_id: String,
    pub refund_of: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl PaymentTransaction {
    pub fn pending_payment(
        external_ref: &str,
        order_id: &str,
        amount: i64,
        payment_method_id: &str,
        raw_gateway_payload: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            transaction_id: Uuid::new_v4(),
            external_ref: external_ref.to_string(),
            order_id: order_id.to_string(),
            amount,
            transaction_type: TransactionType::Payment,
            status: TransactionStatus::PendingUserAction,
            gateway_transaction_no: None,
            raw_gateway_payload,
            payment_method_id: payment_method_id.to_string(),
            refund_of: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn refund(
        external_ref: &str,
        original: &PaymentTransaction,
        amount: i64,
        status: TransactionStatus,
        raw_gateway_payload: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            transaction_id: Uuid::new_v4(),
            external_ref: external_ref.to_string(),
            order_id: original.order_id.clone(),
            amount,
            transaction_type: TransactionType::Refund,
            status,
            gateway_transaction_no: None,
            raw_gateway_payload,
            payment_method_id: original.payment_method_id.clone(),
            refund_of: Some(original.external_ref.clone()),
            created_at: now,
            updated_at: now,
        }
    }
}
