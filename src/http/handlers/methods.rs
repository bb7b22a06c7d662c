use crate::domain::method::{CardDetails, PaymentMethodType};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CardInput {
    pub number: String,
    pub holder_name: String,
    pub expiry_month: u8,
    pub expiry_year: u16,
    pub issuing_bank: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterMethodBody {
    pub method_type: PaymentMethodType,
    pub card: Option<CardInput>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

pub async fn register_method(
    State(state): State<AppState>,
    Json(body): Json<RegisterMethodBody>,
) -> impl IntoResponse {
    let card = body.card.map(|c| {
        CardDetails::from_pan(&c.number, &c.holder_name, c.expiry_month, c.expiry_year, c.issuing_bank)
    });
    let method = state
        .method_registry
        .register(body.method_type, card, body.user_id, body.is_default);
    (StatusCode::CREATED, Json(method))
}

pub async fn list_methods(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.method_registry.list())
}
