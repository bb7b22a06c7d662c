use crate::error::PaymentError;
use std::collections::HashMap;

pub const VERSION: &str = "vnp_Version";
pub const COMMAND: &str = "vnp_Command";
pub const TMN_CODE: &str = "vnp_TmnCode";
pub const AMOUNT: &str = "vnp_Amount";
pub const CURR_CODE: &str = "vnp_CurrCode";
pub const TXN_REF: &str = "vnp_TxnRef";
pub const ORDER_INFO: &str = "vnp_OrderInfo";
pub const ORDER_TYPE: &str = "vnp_OrderType";
pub const LOCALE: &str = "vnp_Locale";
pub const RETURN_URL: &str = "vnp_ReturnUrl";
pub const CREATE_DATE: &str = "vnp_CreateDate";
pub const EXPIRE_DATE: &str = "vnp_ExpireDate";
pub const BANK_CODE: &str = "vnp_BankCode";
pub const RESPONSE_CODE: &str = "vnp_ResponseCode";
pub const TRANSACTION_NO: &str = "vnp_TransactionNo";
pub const TRANSACTION_TYPE: &str = "vnp_TransactionType";
pub const TRANSACTION_DATE: &str = "vnp_TransactionDate";
pub const PAY_DATE: &str = "vnp_PayDate";
pub const REQUEST_ID: &str = "vnp_RequestId";
pub const CREATE_BY: &str = "vnp_CreateBy";

pub const INTERNATIONAL_CARD_CODE: &str = "INTCARD";
pub const GATEWAY_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

pub fn format_gateway_time(at: chrono::DateTime<chrono::Utc>, utc_offset_hours: i32) -> String {
    (at + chrono::Duration::hours(utc_offset_hours as i64))
        .format(GATEWAY_DATE_FORMAT)
        .to_string()
}

#[derive(Debug, Clone)]
pub struct CallbackFields {
    pub txn_ref: String,
    pub response_code: String,
    pub transaction_no: Option<String>,
    pub amount: Option<i64>,
    pub bank_code: Option<String>,
    pub pay_date: Option<String>,
}

pub fn parse_callback(params: &HashMap<String, String>) -> Result<CallbackFields, PaymentError> {
    let txn_ref = required(params, TXN_REF)?;
    let response_code = required(params, RESPONSE_CODE)?;
    let amount = params
        .get(AMOUNT)
        .map(|a| {
            a.parse::<i64>()
                .map_err(|_| PaymentError::Security(format!("unparseable {AMOUNT} in signed callback")))
        })
        .transpose()?;

    Ok(CallbackFields {
        txn_ref,
        response_code,
        transaction_no: params.get(TRANSACTION_NO).cloned(),
        amount,
        bank_code: params.get(BANK_CODE).cloned(),
        pay_date: params.get(PAY_DATE).cloned(),
    })
}

fn required(params: &HashMap<String, String>, key: &str) -> Result<String, PaymentError> {
    match params.get(key) {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(PaymentError::Security(format!("signed callback is missing {key}"))),
    }
}

#[derive(Debug, Clone)]
pub struct GatewayPayload {
    pub response_code: Option<String>,
    pub transaction_no: Option<String>,
    pub amount: Option<i64>,
}

pub fn parse_gateway_payload(raw: &str) -> GatewayPayload {
    let value: serde_json::Value = serde_json::from_str(raw).unwrap_or_default();
    GatewayPayload {
        response_code: string_field(&value, RESPONSE_CODE),
        transaction_no: string_field(&value, TRANSACTION_NO),
        amount: string_field(&value, AMOUNT).and_then(|a| a.parse().ok()),
    }
}

fn string_field(value: &serde_json::Value, key: &str) -> Option<String> {
    match value.get(key) {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

pub fn sanitize_text(input: &str, max_len: usize) -> String {
    input.chars().filter(|c| !c.is_control()).take(max_len).collect()
}

pub fn sanitize_reference(input: &str, max_len: usize) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(max_len)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_hostile_text_as_data() {
        let out = sanitize_text("<script>alert(1)</script>'; DROP TABLE orders;--", 255);
        assert_eq!(out, "<script>alert(1)</script>'; DROP TABLE orders;--");
        assert_eq!(sanitize_text("line\r\nbreak\u{0}", 255), "linebreak");
    }

    #[test]
    fn sanitize_reference_strips_metacharacters() {
        assert_eq!(sanitize_reference("ORDER<123>&x=1", 32), "ORDER123x1");
        assert_eq!(sanitize_reference(&"A".repeat(100), 20).len(), 20);
    }

    #[test]
    fn payload_parser_reads_strings_and_numbers() {
        let parsed = parse_gateway_payload(r#"{"vnp_ResponseCode":"00","vnp_Amount":25000000}"#);
        assert_eq!(parsed.response_code.as_deref(), Some("00"));
        assert_eq!(parsed.amount, Some(25_000_000));
        let empty = parse_gateway_payload("not json");
        assert!(empty.response_code.is_none());
    }
}
