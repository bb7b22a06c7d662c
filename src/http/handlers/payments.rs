use crate::domain::order::OrderSnapshot;
use crate::error::{GatewayErrorKind, PaymentError};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentBody {
    pub order: OrderSnapshot,
    pub payment_method_id: String,
    #[serde(default)]
    pub client_params: HashMap<String, String>,
}

pub async fn create_payment(
    State(state): State<AppState>,
    Json(body): Json<CreatePaymentBody>,
) -> impl IntoResponse {
    match state
        .payment_service
        .process_payment(&body.order, &body.payment_method_id, &body.client_params)
        .await
    {
        Ok(txn) => (StatusCode::OK, Json(txn)).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Serialize)]
pub struct IpnAck {
    #[serde(rename = "RspCode")]
    pub rsp_code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

pub async fn gateway_ipn(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let (rsp_code, message) = match state
        .payment_service
        .update_transaction_status_from_callback(&params)
        .await
    {
        Ok(_) => ("00", "Confirm Success"),
        Err(PaymentError::NotFound(_)) => ("01", "Order not found"),
        Err(PaymentError::Security(_)) => ("97", "Invalid signature"),
        Err(_) => ("99", "Unknown error"),
    };

    Json(IpnAck {
        rsp_code: rsp_code.to_string(),
        message: message.to_string(),
    })
}

pub async fn check_status(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let external_ref = params.get("external_ref").map(String::as_str);
    match state
        .payment_service
        .check_payment_status(Some(transaction_id), external_ref)
        .await
    {
        Ok(txn) => (StatusCode::OK, Json(txn)).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct RefundBody {
    pub original_txn_ref: String,
    pub order: OrderSnapshot,
    pub amount: i64,
    pub reason: String,
}

pub async fn refund(State(state): State<AppState>, Json(body): Json<RefundBody>) -> impl IntoResponse {
    match state
        .payment_service
        .process_refund(&body.original_txn_ref, &body.order, body.amount, &body.reason)
        .await
    {
        Ok(txn) => (StatusCode::OK, Json(txn)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub fn error_response(e: PaymentError) -> axum::response::Response {
    let status = match &e {
        PaymentError::Validation(_) => StatusCode::BAD_REQUEST,
        PaymentError::Security(_) => StatusCode::FORBIDDEN,
        PaymentError::Gateway {
            kind: GatewayErrorKind::Timeout,
            ..
        } => StatusCode::GATEWAY_TIMEOUT,
        PaymentError::Gateway { .. } => StatusCode::BAD_GATEWAY,
        PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
        PaymentError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(e.envelope())).into_response()
}
