use crate::domain::method::{CardDetails, PaymentMethod};
use crate::domain::order::OrderSnapshot;
use crate::error::{GatewayErrorKind, PaymentError};
use crate::gateway::{fields, signing, PaymentGateway, PaymentRedirect, RefundOutcome, StatusOutcome};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

pub struct MockGateway {
    pub secret: String,
    pub behavior: String,
    calls: AtomicUsize,
    network_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new(secret: &str, behavior: &str) -> Self {
        Self {
            secret: secret.to_string(),
            behavior: behavior.to_string(),
            calls: AtomicUsize::new(0),
            network_calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn network_call_count(&self) -> usize {
        self.network_calls.load(Ordering::SeqCst)
    }

    fn signed_response(&self, response_code: &str, txn_ref: &str) -> (HashMap<String, String>, String) {
        let mut params = HashMap::new();
        params.insert(fields::TXN_REF.to_string(), txn_ref.to_string());
        params.insert(fields::RESPONSE_CODE.to_string(), response_code.to_string());
        params.insert(fields::TRANSACTION_NO.to_string(), format!("mock_{}", Uuid::new_v4().simple()));
        let signature = signing::sign(&self.secret, &signing::canonicalize(&params));
        params.insert(signing::SIGNATURE_FIELD.to_string(), signature);
        let body = serde_json::to_string(&params).unwrap_or_default();
        (params, body)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn prepare_payment_parameters(
        &self,
        order: &OrderSnapshot,
        _method: &PaymentMethod,
        _card: Option<&CardDetails>,
    ) -> Result<HashMap<String, String>, PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        order.validate()?;

        let amount = order
            .amount
            .checked_mul(100)
            .ok_or_else(|| PaymentError::Validation("amount overflows gateway units".to_string()))?;
        let suffix = Uuid::new_v4().simple().to_string();

        let mut params = HashMap::new();
        params.insert(fields::COMMAND.to_string(), "pay".to_string());
        params.insert(fields::TMN_CODE.to_string(), "MOCK".to_string());
        params.insert(fields::AMOUNT.to_string(), amount.to_string());
        params.insert(
            fields::TXN_REF.to_string(),
            format!("{}-{}", fields::sanitize_reference(&order.order_id, 24), &suffix[..8]),
        );
        Ok(params)
    }

    fn build_redirect(&self, params: &HashMap<String, String>) -> Result<PaymentRedirect, PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let txn_ref = params
            .get(fields::TXN_REF)
            .cloned()
            .ok_or_else(|| PaymentError::Configuration("missing transaction reference".to_string()))?;

        let signature = signing::sign(&self.secret, &signing::canonicalize(params));
        let mut url = url::Url::parse("https://mock.gateway.test/pay").expect("static mock url parses");
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
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
        signing::verify(&self.secret, params)
    }

    fn prepare_refund_parameters(
        &self,
        _order: &OrderSnapshot,
        original_txn_ref: &str,
        refund_amount: i64,
        reason: &str,
    ) -> Result<HashMap<String, String>, PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if refund_amount <= 0 {
            return Err(PaymentError::Validation("refund amount must be > 0".to_string()));
        }

        let mut params = HashMap::new();
        params.insert(fields::REQUEST_ID.to_string(), Uuid::new_v4().simple().to_string());
        params.insert(fields::COMMAND.to_string(), "refund".to_string());
        params.insert(fields::TXN_REF.to_string(), original_txn_ref.to_string());
        params.insert(fields::AMOUNT.to_string(), (refund_amount * 100).to_string());
        params.insert(fields::ORDER_INFO.to_string(), fields::sanitize_text(reason, 255));
        Ok(params)
    }

    async fn submit_refund(&self, params: HashMap<String, String>) -> Result<RefundOutcome, PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.network_calls.fetch_add(1, Ordering::SeqCst);

        let request_ref = params
            .get(fields::REQUEST_ID)
            .cloned()
            .ok_or_else(|| PaymentError::Configuration("missing request id".to_string()))?;
        let txn_ref = params.get(fields::TXN_REF).cloned().unwrap_or_default();

        match self.behavior.as_str() {
            "ALWAYS_TIMEOUT" => Err(PaymentError::gateway(GatewayErrorKind::Timeout, "mock timeout")),
            "NETWORK_ERROR" => Err(PaymentError::gateway(GatewayErrorKind::Network, "mock network error")),
            "REFUND_DECLINED" => {
                let (response, body) = self.signed_response("99", &txn_ref);
                Ok(RefundOutcome {
                    request_ref,
                    response_code: "99".to_string(),
                    transaction_no: response.get(fields::TRANSACTION_NO).cloned(),
                    raw_payload: body,
                })
            }
            _ => {
                let (response, body) = self.signed_response("00", &txn_ref);
                Ok(RefundOutcome {
                    request_ref,
                    response_code: "00".to_string(),
                    transaction_no: response.get(fields::TRANSACTION_NO).cloned(),
                    raw_payload: body,
                })
            }
        }
    }

    async fn query_transaction_status(
        &self,
        txn_ref: &str,
        _order_id: &str,
        _txn_date: &str,
    ) -> Result<StatusOutcome, PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.network_calls.fetch_add(1, Ordering::SeqCst);

        let code = match self.behavior.as_str() {
            "ALWAYS_TIMEOUT" => {
                return Err(PaymentError::gateway(GatewayErrorKind::Timeout, "mock timeout"))
            }
            "NETWORK_ERROR" => {
                return Err(PaymentError::gateway(GatewayErrorKind::Network, "mock network error"))
            }
            "QUERY_NOT_FOUND" => {
                return Err(PaymentError::NotFound(format!("gateway has no transaction {txn_ref}")))
            }
            "QUERY_CANCELLED" => "24",
            "QUERY_FAILED" => "07",
            _ => "00",
        };

        let (response, body) = self.signed_response(code, txn_ref);
        Ok(StatusOutcome {
            txn_ref: txn_ref.to_string(),
            response_code: code.to_string(),
            transaction_no: response.get(fields::TRANSACTION_NO).cloned(),
            raw_payload: body,
        })
    }
}
