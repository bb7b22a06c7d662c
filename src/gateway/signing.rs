use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::collections::HashMap;

type HmacSha512 = Hmac<Sha512>;

pub const SIGNATURE_FIELD: &str = "vnp_SecureHash";
pub const SIGNATURE_TYPE_FIELD: &str = "vnp_SecureHashType";
pub const SIGNED_PREFIX: &str = "vnp_";

pub fn is_signed_field(key: &str) -> bool {
    key.starts_with(SIGNED_PREFIX) && key != SIGNATURE_FIELD && key != SIGNATURE_TYPE_FIELD
}

pub fn canonicalize(params: &HashMap<String, String>) -> String {
    let mut signed: Vec<(&str, &str)> = params
        .iter()
        .filter(|(k, _)| is_signed_field(k))
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    signed.sort_by(|a, b| a.0.cmp(b.0));
    signed
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn sign(secret: &str, canonical: &str) -> String {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC can take any size key");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn verify(secret: &str, params: &HashMap<String, String>) -> bool {
    let provided = match params.get(SIGNATURE_FIELD) {
        Some(s) if !s.is_empty() => s,
        _ => return false,
    };
    let expected = sign(secret, &canonicalize(params));
    constant_time_eq(provided, &expected)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
