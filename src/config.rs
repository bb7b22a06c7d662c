use crate::domain::transaction::TransactionStatus;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub gateway_pay_url: String,
    pub gateway_api_url: String,
    pub merchant_code: String,
    pub hash_secret: String,
    pub return_url: String,
    pub gateway_version: String,
    pub currency_code: String,
    pub locale: String,
    pub unit_multiplier: i64,
    pub expire_minutes: i64,
    pub gateway_timeout_ms: u64,
    pub gateway_utc_offset_hours: i32,
    pub callback_max_age_minutes: Option<i64>,
    pub status_codes: StatusCodeMap,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            gateway_pay_url: std::env::var("GATEWAY_PAY_URL")
                .unwrap_or_else(|_| "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string()),
            gateway_api_url: std::env::var("GATEWAY_API_URL")
                .unwrap_or_else(|_| "https://sandbox.vnpayment.vn/merchant_webapi/api/transaction".to_string()),
            merchant_code: std::env::var("GATEWAY_MERCHANT_CODE").unwrap_or_else(|_| "DEMOTMN1".to_string()),
            hash_secret: std::env::var("GATEWAY_HASH_SECRET").unwrap_or_else(|_| "dev-hash-secret".to_string()),
            return_url: std::env::var("GATEWAY_RETURN_URL")
                .unwrap_or_else(|_| "https://localhost:3000/payments/return".to_string()),
            gateway_version: std::env::var("GATEWAY_VERSION").unwrap_or_else(|_| "2.1.0".to_string()),
            currency_code: std::env::var("GATEWAY_CURRENCY").unwrap_or_else(|_| "VND".to_string()),
            locale: std::env::var("GATEWAY_LOCALE").unwrap_or_else(|_| "vn".to_string()),
            unit_multiplier: env_i64("GATEWAY_UNIT_MULTIPLIER", 100),
            expire_minutes: env_i64("GATEWAY_EXPIRE_MINUTES", 15),
            gateway_timeout_ms: env_i64("GATEWAY_TIMEOUT_MS", 5000) as u64,
            gateway_utc_offset_hours: env_i64("GATEWAY_UTC_OFFSET_HOURS", 7) as i32,
            callback_max_age_minutes: std::env::var("CALLBACK_MAX_AGE_MINUTES")
                .ok()
                .and_then(|s| s.parse::<i64>().ok()),
            status_codes: StatusCodeMap::from_env(),
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key).ok().and_then(|s| s.parse::<i64>().ok()).unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct StatusCodeMap {
    pub success_code: String,
    pub cancel_codes: Vec<String>,
}

impl StatusCodeMap {
    pub fn from_env() -> Self {
        Self {
            success_code: std::env::var("STATUS_SUCCESS_CODE").unwrap_or_else(|_| "00".to_string()),
            cancel_codes: std::env::var("STATUS_CANCEL_CODES")
                .unwrap_or_else(|_| "24".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn classify(&self, response_code: &str) -> TransactionStatus {
        if response_code == self.success_code {
            TransactionStatus::Success
        } else if self.cancel_codes.iter().any(|c| c == response_code) {
            TransactionStatus::Cancelled
        } else {
            TransactionStatus::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_driven_by_the_map() {
        let map = StatusCodeMap {
            success_code: "00".to_string(),
            cancel_codes: vec!["24".to_string(), "11".to_string()],
        };
        assert_eq!(map.classify("00"), TransactionStatus::Success);
        assert_eq!(map.classify("24"), TransactionStatus::Cancelled);
        assert_eq!(map.classify("11"), TransactionStatus::Cancelled);
        assert_eq!(map.classify("07"), TransactionStatus::Failed);
        assert_eq!(map.classify("99"), TransactionStatus::Failed);
    }
}
