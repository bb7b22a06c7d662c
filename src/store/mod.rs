use crate::domain::transaction::{PaymentTransaction, TransactionStatus};
use crate::error::PaymentError;
use uuid::Uuid;

pub mod memory;

#[derive(Debug, Clone)]
pub struct TransactionUpdate {
    pub status: TransactionStatus,
    pub gateway_transaction_no: Option<String>,
    pub raw_gateway_payload: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppliedUpdate {
    pub transaction: PaymentTransaction,
    pub applied: bool,
}

#[async_trait::async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert(&self, txn: PaymentTransaction) -> Result<(), PaymentError>;

    async fn by_external_ref(&self, external_ref: &str) -> Result<Option<PaymentTransaction>, PaymentError>;

    async fn by_transaction_id(&self, transaction_id: Uuid) -> Result<Option<PaymentTransaction>, PaymentError>;

    async fn pending_for_order(&self, order_id: &str) -> Result<Option<PaymentTransaction>, PaymentError>;

    async fn apply_update(
        &self,
        external_ref: &str,
        update: TransactionUpdate,
    ) -> Result<AppliedUpdate, PaymentError>;
}
