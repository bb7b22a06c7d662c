use payment_core::gateway::signing::{canonicalize, sign, verify, SIGNATURE_FIELD};
use std::collections::HashMap;

const SECRET: &str = "test-hash-secret";

fn signed_params() -> HashMap<String, String> {
    let mut params = HashMap::new();
    params.insert("vnp_Amount".to_string(), "25000000".to_string());
    params.insert("vnp_TxnRef".to_string(), "ORDER123-a1b2c3d4".to_string());
    params.insert("vnp_ResponseCode".to_string(), "00".to_string());
    params.insert("vnp_BankCode".to_string(), "NCB".to_string());
    params.insert("vnp_TransactionNo".to_string(), "14422574".to_string());
    let signature = sign(SECRET, &canonicalize(&params));
    params.insert(SIGNATURE_FIELD.to_string(), signature);
    params
}

#[test]
fn canonicalization_is_insertion_order_independent() {
    let keys = [
        ("vnp_TxnRef", "ORDER123-a1b2c3d4"),
        ("vnp_Amount", "25000000"),
        ("vnp_ResponseCode", "00"),
        ("vnp_BankCode", "NCB"),
    ];

    let mut forward = HashMap::new();
    for (k, v) in keys {
        forward.insert(k.to_string(), v.to_string());
    }
    let mut reversed = HashMap::new();
    for (k, v) in keys.iter().rev() {
        reversed.insert(k.to_string(), v.to_string());
    }

    let canonical = canonicalize(&forward);
    assert_eq!(canonical, canonicalize(&reversed));
    assert_eq!(
        canonical,
        "vnp_Amount=25000000&vnp_BankCode=NCB&vnp_ResponseCode=00&vnp_TxnRef=ORDER123-a1b2c3d4"
    );
}

#[test]
fn valid_signature_verifies() {
    assert!(verify(SECRET, &signed_params()));
}

#[test]
fn wrong_secret_fails() {
    assert!(!verify("another-secret", &signed_params()));
}

#[test]
fn each_signed_field_is_tamper_evident() {
    for field in ["vnp_Amount", "vnp_TxnRef", "vnp_ResponseCode", "vnp_BankCode"] {
        let mut params = signed_params();
        params.insert(field.to_string(), "tampered".to_string());
        assert!(!verify(SECRET, &params), "mutating {field} must invalidate the signature");
    }
}

#[test]
fn missing_or_empty_signature_fails() {
    let mut absent = signed_params();
    absent.remove(SIGNATURE_FIELD);
    assert!(!verify(SECRET, &absent));

    let mut empty = signed_params();
    empty.insert(SIGNATURE_FIELD.to_string(), String::new());
    assert!(!verify(SECRET, &empty));
}

#[test]
fn unsigned_keys_injected_after_signing_do_not_break_verification() {
    let mut params = signed_params();
    params.insert("injected".to_string(), "<script>alert(1)</script>".to_string());
    params.insert("utm_source".to_string(), "phishing".to_string());
    assert!(verify(SECRET, &params));
}

#[test]
fn injected_signed_schema_key_breaks_verification() {
    let mut params = signed_params();
    params.insert("vnp_PayDate".to_string(), "20260101000000".to_string());
    assert!(!verify(SECRET, &params));
}

#[test]
fn signature_is_deterministic_lowercase_hex() {
    let canonical = canonicalize(&signed_params());
    let first = sign(SECRET, &canonical);
    let second = sign(SECRET, &canonical);
    assert_eq!(first, second);
    assert_eq!(first.len(), 128);
    assert_eq!(first, first.to_lowercase());
}
