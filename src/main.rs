use axum::routing::{get, post};
use axum::Router;
use payment_core::config::AppConfig;
use payment_core::domain::method::MethodRegistry;
use payment_core::gateway::vnpay::VnpayGateway;
use payment_core::metrics::TracingMetricsSink;
use payment_core::service::payment_service::PaymentService;
use payment_core::store::memory::InMemoryTransactionStore;
use payment_core::AppState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let gateway = Arc::new(VnpayGateway {
        pay_url: cfg.gateway_pay_url.clone(),
        api_url: cfg.gateway_api_url.clone(),
        merchant_code: cfg.merchant_code.clone(),
        hash_secret: cfg.hash_secret.clone(),
        return_url: cfg.return_url.clone(),
        version: cfg.gateway_version.clone(),
        currency_code: cfg.currency_code.clone(),
        locale: cfg.locale.clone(),
        unit_multiplier: cfg.unit_multiplier,
        expire_minutes: cfg.expire_minutes,
        timeout_ms: cfg.gateway_timeout_ms,
        utc_offset_hours: cfg.gateway_utc_offset_hours,
        client: reqwest::Client::new(),
    });

    let method_registry = MethodRegistry::new();
    let payment_service = PaymentService {
        gateway,
        store: Arc::new(InMemoryTransactionStore::new()),
        methods: method_registry.clone(),
        status_codes: cfg.status_codes.clone(),
        metrics: Arc::new(TracingMetricsSink),
        callback_max_age_minutes: cfg.callback_max_age_minutes,
        gateway_utc_offset_hours: cfg.gateway_utc_offset_hours,
    };

    let state = AppState {
        payment_service,
        method_registry,
    };

    let app = Router::new()
        .route("/health", get(payment_core::http::handlers::payments::health))
        .route("/payments", post(payment_core::http::handlers::payments::create_payment))
        .route("/payments/ipn", get(payment_core::http::handlers::payments::gateway_ipn))
        .route(
            "/payments/:transaction_id/status",
            get(payment_core::http::handlers::payments::check_status),
        )
        .route("/payments/refund", post(payment_core::http::handlers::payments::refund))
        .route(
            "/payment-methods",
            post(payment_core::http::handlers::methods::register_method)
                .get(payment_core::http::handlers::methods::list_methods),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
