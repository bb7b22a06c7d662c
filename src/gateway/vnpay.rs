use crate::domain::method::{CardDetails, PaymentMethod};
use crate::domain::order::OrderSnapshot;
use crate::error::{GatewayErrorKind, PaymentError};
use crate::gateway::{fields, signing, PaymentGateway, PaymentRedirect, RefundOutcome, StatusOutcome};
use std::collections::HashMap;
use uuid::Uuid;

pub const COMMAND_PAY: &str = "pay";
pub const COMMAND_QUERY: &str = "querydr";
pub const COMMAND_REFUND: &str = "refund";
pub const RESPONSE_CODE_NOT_FOUND: &str = "91";

pub struct VnpayGateway {
    pub pay_url: String,
    pub api_url: String,
    pub merchant_code: String,
    pub hash_secret: String,
    pub return_url: String,
    pub version: String,
    pub currency_code: String,
    pub locale: String,
    pub unit_multiplier: i64,
    pub expire_minutes: i64,
    pub timeout_ms: u64,
    pub utc_offset_hours: i32,
    pub client: reqwest::Client,
}

impl VnpayGateway {
    fn gateway_time(&self, at: chrono::DateTime<chrono::Utc>) -> String {
        fields::format_gateway_time(at, self.utc_offset_hours)
    }

    fn convert_amount(&self, amount: i64) -> Result<i64, PaymentError> {
        amount
            .checked_mul(self.unit_multiplier)
            .ok_or_else(|| PaymentError::Validation(format!("amount {amount} overflows gateway units")))
    }

    async fn post_signed(&self, mut params: HashMap<String, String>) -> Result<(HashMap<String, String>, String), PaymentError> {
        let signature = signing::sign(&self.hash_secret, &signing::canonicalize(&params));
        params.insert(signing::SIGNATURE_FIELD.to_string(), signature);

        let resp = self
            .client
            .post(&self.api_url)
            .json(&params)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await;

        let resp = match resp {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                return Err(PaymentError::gateway(
                    GatewayErrorKind::Network,
                    format!("gateway returned HTTP {}", r.status().as_u16()),
                ))
            }
            Err(e) if e.is_timeout() => {
                return Err(PaymentError::gateway(GatewayErrorKind::Timeout, "gateway call timed out"))
            }
            Err(e) => return Err(PaymentError::gateway(GatewayErrorKind::Network, e.to_string())),
        };

        let body = resp
            .text()
            .await
            .map_err(|e| PaymentError::gateway(GatewayErrorKind::Network, e.to_string()))?;
        let response_params = parse_response_map(&body)?;

        if !signing::verify(&self.hash_secret, &response_params) {
            return Err(PaymentError::Security("gateway response signature is invalid".to_string()));
        }

        Ok((response_params, body))
    }
}

fn parse_response_map(body: &str) -> Result<HashMap<String, String>, PaymentError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|_| PaymentError::gateway(GatewayErrorKind::MalformedResponse, "gateway response is not JSON"))?;
    let object = value
        .as_object()
        .ok_or_else(|| PaymentError::gateway(GatewayErrorKind::MalformedResponse, "gateway response is not an object"))?;

    let mut params = HashMap::new();
    for (key, val) in object {
        let text = match val {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        params.insert(key.clone(), text);
    }
    Ok(params)
}

fn response_code(params: &HashMap<String, String>) -> Result<String, PaymentError> {
    params
        .get(fields::RESPONSE_CODE)
        .filter(|c| !c.is_empty())
        .cloned()
        .ok_or_else(|| {
            PaymentError::gateway(GatewayErrorKind::MalformedResponse, "gateway response has no response code")
        })
}

#[async_trait::async_trait]
impl PaymentGateway for VnpayGateway {
    fn name(&self) -> &'static str {
        "vnpay"
    }

    fn prepare_payment_parameters(
        &self,
        order: &OrderSnapshot,
        method: &PaymentMethod,
        card: Option<&CardDetails>,
    ) -> Result<HashMap<String, String>, PaymentError> {
        order.validate()?;

        let amount = self.convert_amount(order.amount)?;
        let suffix = Uuid::new_v4().simple().to_string();
        let txn_ref = format!("{}-{}", fields::sanitize_reference(&order.order_id, 24), &suffix[..8]);
        let created = chrono::Utc::now();
        let expires = created + chrono::Duration::minutes(self.expire_minutes.max(1));

        let mut params = HashMap::new();
        params.insert(fields::VERSION.to_string(), self.version.clone());
        params.insert(fields::COMMAND.to_string(), COMMAND_PAY.to_string());
        params.insert(fields::TMN_CODE.to_string(), self.merchant_code.clone());
        params.insert(fields::AMOUNT.to_string(), amount.to_string());
        params.insert(fields::CURR_CODE.to_string(), self.currency_code.clone());
        params.insert(fields::TXN_REF.to_string(), txn_ref);
        params.insert(
            fields::ORDER_INFO.to_string(),
            fields::sanitize_text(&format!("Payment for order {}", order.order_id), 255),
        );
        params.insert(fields::ORDER_TYPE.to_string(), "other".to_string());
        params.insert(fields::LOCALE.to_string(), self.locale.clone());
        params.insert(fields::RETURN_URL.to_string(), self.return_url.clone());
        params.insert(fields::CREATE_DATE.to_string(), self.gateway_time(created));
        params.insert(fields::EXPIRE_DATE.to_string(), self.gateway_time(expires));

        let card = card.or(method.card.as_ref());
        if let Some(bank) = card.and_then(|c| c.issuing_bank.as_deref()) {
            params.insert(fields::BANK_CODE.to_string(), bank.to_string());
        }

        Ok(params)
    }

    fn build_redirect(&self, params: &HashMap<String, String>) -> Result<PaymentRedirect, PaymentError> {
        let txn_ref = params
            .get(fields::TXN_REF)
            .cloned()
            .ok_or_else(|| PaymentError::Configuration("payment parameters are missing a transaction reference".to_string()))?;

        let signature = signing::sign(&self.hash_secret, &signing::canonicalize(params));

        let mut url = url::Url::parse(&self.pay_url)
            .map_err(|e| PaymentError::Configuration(format!("invalid gateway pay url: {e}")))?;
        {
            let mut sorted: Vec<(&String, &String)> = params.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let mut query = url.query_pairs_mut();
            for (key, value) in sorted {
                query.append_pair(key, value);
            }
            query.append_pair(signing::SIGNATURE_FIELD, &signature);
        }

        Ok(PaymentRedirect {
            payment_url: url.to_string(),
            txn_ref,
        })
    }

    fn validate_response_signature(&self, params: &HashMap<String, String>) -> bool {
        signing::verify(&self.hash_secret, params)
    }

    fn prepare_refund_parameters(
        &self,
        order: &OrderSnapshot,
        original_txn_ref: &str,
        refund_amount: i64,
        reason: &str,
    ) -> Result<HashMap<String, String>, PaymentError> {
        if refund_amount <= 0 {
            return Err(PaymentError::Validation("refund amount must be > 0".to_string()));
        }

        let amount = self.convert_amount(refund_amount)?;
        let transaction_type = if refund_amount >= order.amount { "02" } else { "03" };
        let now = chrono::Utc::now();

        let mut params = HashMap::new();
        params.insert(fields::REQUEST_ID.to_string(), Uuid::new_v4().simple().to_string());
        params.insert(fields::VERSION.to_string(), self.version.clone());
        params.insert(fields::COMMAND.to_string(), COMMAND_REFUND.to_string());
        params.insert(fields::TMN_CODE.to_string(), self.merchant_code.clone());
        params.insert(fields::TXN_REF.to_string(), original_txn_ref.to_string());
        params.insert(fields::AMOUNT.to_string(), amount.to_string());
        params.insert(fields::TRANSACTION_TYPE.to_string(), transaction_type.to_string());
        params.insert(fields::ORDER_INFO.to_string(), fields::sanitize_text(reason, 255));
        params.insert(fields::TRANSACTION_DATE.to_string(), self.gateway_time(order.created_at));
        params.insert(fields::CREATE_DATE.to_string(), self.gateway_time(now));
        params.insert(fields::CREATE_BY.to_string(), "payment-core".to_string());

        Ok(params)
    }

    async fn submit_refund(&self, params: HashMap<String, String>) -> Result<RefundOutcome, PaymentError> {
        let request_ref = params
            .get(fields::REQUEST_ID)
            .cloned()
            .ok_or_else(|| PaymentError::Configuration("refund parameters are missing a request id".to_string()))?;

        let (response_params, body) = self.post_signed(params).await?;
        let code = response_code(&response_params)?;

        Ok(RefundOutcome {
            request_ref,
            response_code: code,
            transaction_no: response_params.get(fields::TRANSACTION_NO).cloned(),
            raw_payload: body,
        })
    }

    async fn query_transaction_status(
        &self,
        txn_ref: &str,
        order_id: &str,
        txn_date: &str,
    ) -> Result<StatusOutcome, PaymentError> {
        let mut params = HashMap::new();
        params.insert(fields::REQUEST_ID.to_string(), Uuid::new_v4().simple().to_string());
        params.insert(fields::VERSION.to_string(), self.version.clone());
        params.insert(fields::COMMAND.to_string(), COMMAND_QUERY.to_string());
        params.insert(fields::TMN_CODE.to_string(), self.merchant_code.clone());
        params.insert(fields::TXN_REF.to_string(), txn_ref.to_string());
        params.insert(
            fields::ORDER_INFO.to_string(),
            fields::sanitize_text(&format!("Status query for order {order_id}"), 255),
        );
        params.insert(fields::TRANSACTION_DATE.to_string(), txn_date.to_string());
        params.insert(fields::CREATE_DATE.to_string(), self.gateway_time(chrono::Utc::now()));

        let (response_params, body) = self.post_signed(params).await?;
        let code = response_code(&response_params)?;

        if code == RESPONSE_CODE_NOT_FOUND {
            return Err(PaymentError::NotFound(format!("gateway has no transaction {txn_ref}")));
        }

        Ok(StatusOutcome {
            txn_ref: txn_ref.to_string(),
            response_code: code,
            transaction_no: response_params.get(fields::TRANSACTION_NO).cloned(),
            raw_payload: body,
        })
    }
}
