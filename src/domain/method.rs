use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethodType {
    CreditCard,
    DomesticDebitCard,
    BankTransfer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDetails {
    pub masked_number: String,
    pub holder_name: String,
    pub expiry_month: u8,
    pub expiry_year: u16,
    pub issuing_bank: Option<String>,
}

impl CardDetails {
    pub fn from_pan(
        pan: &str,
        holder_name: &str,
        expiry_month: u8,
        expiry_year: u16,
        issuing_bank: Option<String>,
    ) -> Self {
        let digits: String = pan.chars().filter(|c| c.is_ascii_digit()).collect();
        let last4 = if digits.len() >= 4 { &digits[digits.len() - 4..] } else { digits.as_str() };
        Self {
            masked_number: format!("************{last4}"),
            holder_name: holder_name.to_string(),
            expiry_month,
            expiry_year,
            issuing_bank,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub method_id: String,
    pub method_type: PaymentMethodType,
    pub card: Option<CardDetails>,
    pub user_id: Option<String>,
    pub is_default: bool,
}

#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: Arc<DashMap<String, PaymentMethod>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        method_type: PaymentMethodType,
        card: Option<CardDetails>,
        user_id: Option<String>,
        is_default: bool,
    ) -> PaymentMethod {
        let method = PaymentMethod {
            method_id: Uuid::new_v4().simple().to_string(),
            method_type,
            card,
            user_id,
            is_default,
        };
        self.methods.insert(method.method_id.clone(), method.clone());
        method
    }

    pub fn get(&self, method_id: &str) -> Option<PaymentMethod> {
        self.methods.get(method_id).map(|m| m.clone())
    }

    pub fn list(&self) -> Vec<PaymentMethod> {
        self.methods.iter().map(|m| m.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_details_keep_only_last_four_digits() {
        let card = CardDetails::from_pan("4111 1111 1111 1234", "N VAN A", 12, 2027, None);
        assert_eq!(card.masked_number, "************1234");
        assert!(!card.masked_number.contains("4111"));
        let json = serde_json::to_string(&card).unwrap();
        assert!(!json.to_lowercase().contains("cvv"));
    }
}
