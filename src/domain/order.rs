use crate::error::PaymentError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl OrderSnapshot {
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.order_id.trim().is_empty() {
            return Err(PaymentError::Validation("order id must not be empty".to_string()));
        }
        if self.amount <= 0 {
            return Err(PaymentError::Validation("order amount must be > 0".to_string()));
        }
        Ok(())
    }
}
