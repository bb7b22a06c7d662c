use payment_core::config::StatusCodeMap;
use payment_core::domain::method::{MethodRegistry, PaymentMethodType};
use payment_core::domain::order::OrderSnapshot;
use payment_core::domain::transaction::{PaymentTransaction, TransactionStatus, TransactionType};
use payment_core::error::{GatewayErrorKind, PaymentError};
use payment_core::gateway::mock::MockGateway;
use payment_core::gateway::{fields, signing};
use payment_core::metrics::RecordingMetricsSink;
use payment_core::service::payment_service::PaymentService;
use payment_core::store::memory::InMemoryTransactionStore;
use payment_core::store::TransactionStore;
use std::collections::HashMap;
use std::sync::Arc;

const SECRET: &str = "mock-secret";

struct Harness {
    service: PaymentService,
    store: Arc<InMemoryTransactionStore>,
    gateway: Arc<MockGateway>,
    method_id: String,
}

fn setup(behavior: &str) -> Harness {
    let gateway = Arc::new(MockGateway::new(SECRET, behavior));
    let store = Arc::new(InMemoryTransactionStore::new());
    let methods = MethodRegistry::new();
    let method_id = methods
        .register(PaymentMethodType::CreditCard, None, None, true)
        .method_id;

    let service = PaymentService {
        gateway: gateway.clone(),
        store: store.clone(),
        methods,
        status_codes: StatusCodeMap {
            success_code: "00".to_string(),
            cancel_codes: vec!["24".to_string()],
        },
        metrics: Arc::new(RecordingMetricsSink::new()),
        callback_max_age_minutes: None,
        gateway_utc_offset_hours: 7,
    };

    Harness {
        service,
        store,
        gateway,
        method_id,
    }
}

fn order() -> OrderSnapshot {
    OrderSnapshot {
        order_id: "ORDER123".to_string(),
        amount: 250_000,
        currency: "VND".to_string(),
        created_at: chrono::Utc::now(),
    }
}

fn success_callback(txn_ref: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    params.insert(fields::TXN_REF.to_string(), txn_ref.to_string());
    params.insert(fields::RESPONSE_CODE.to_string(), "00".to_string());
    params.insert(fields::TRANSACTION_NO.to_string(), "14422574".to_string());
    let signature = signing::sign(SECRET, &signing::canonicalize(&params));
    params.insert(signing::SIGNATURE_FIELD.to_string(), signature);
    params
}

async fn paid_transaction(h: &Harness) -> PaymentTransaction {
    let txn = h.service.process_payment(&order(), &h.method_id, &HashMap::new()).await.unwrap();
    h.service
        .update_transaction_status_from_callback(&success_callback(&txn.external_ref))
        .await
        .unwrap()
}

#[tokio::test]
async fn refund_creates_a_linked_transaction_without_touching_the_original() {
    let h = setup("ALWAYS_SUCCESS");
    let original = paid_transaction(&h).await;

    let refund = h
        .service
        .process_refund(&original.external_ref, &order(), 50_000, "customer returned item")
        .await
        .unwrap();

    assert_eq!(refund.transaction_type, TransactionType::Refund);
    assert_eq!(refund.status, TransactionStatus::Success);
    assert_eq!(refund.amount, 50_000);
    assert_eq!(refund.refund_of.as_deref(), Some(original.external_ref.as_str()));
    assert_ne!(refund.external_ref, original.external_ref);
    assert!(refund.gateway_transaction_no.is_some());

    let stored_original = h.store.by_external_ref(&original.external_ref).await.unwrap().unwrap();
    assert_eq!(stored_original.status, TransactionStatus::Success);
    assert_eq!(stored_original.amount, 250_000);

    let stored_refund = h.store.by_external_ref(&refund.external_ref).await.unwrap().unwrap();
    assert_eq!(stored_refund.transaction_type, TransactionType::Refund);
}

#[tokio::test]
async fn refund_requires_a_successful_original() {
    let h = setup("ALWAYS_SUCCESS");
    let pending = h.service.process_payment(&order(), &h.method_id, &HashMap::new()).await.unwrap();

    let err = h
        .service
        .process_refund(&pending.external_ref, &order(), 50_000, "too early")
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Validation(_)));
}

#[tokio::test]
async fn refund_of_unknown_transaction_is_not_found() {
    let h = setup("ALWAYS_SUCCESS");
    let err = h
        .service
        .process_refund("ORDER999-deadbeef", &order(), 50_000, "nothing there")
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::NotFound(_)));
}

#[tokio::test]
async fn refund_amount_bounds_are_validated_before_any_gateway_call() {
    let h = setup("ALWAYS_SUCCESS");
    let original = paid_transaction(&h).await;
    let calls_before = h.gateway.network_call_count();

    let err = h
        .service
        .process_refund(&original.external_ref, &order(), 0, "zero")
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Validation(_)));

    let err = h
        .service
        .process_refund(&original.external_ref, &order(), 300_000, "more than paid")
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Validation(_)));

    assert_eq!(h.gateway.network_call_count(), calls_before);
}

#[tokio::test]
async fn gateway_timeout_reports_refund_not_completed_and_leaves_no_record() {
    let h = setup("ALWAYS_TIMEOUT");
    let original = paid_transaction(&h).await;

    let err = h
        .service
        .process_refund(&original.external_ref, &order(), 50_000, "will time out")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PaymentError::Gateway {
            kind: GatewayErrorKind::Timeout,
            ..
        }
    ));

    let stored_original = h.store.by_external_ref(&original.external_ref).await.unwrap().unwrap();
    assert_eq!(stored_original.status, TransactionStatus::Success);
}

#[tokio::test]
async fn declined_refund_is_recorded_as_failed() {
    let h = setup("REFUND_DECLINED");
    let original = paid_transaction(&h).await;

    let refund = h
        .service
        .process_refund(&original.external_ref, &order(), 50_000, "declined by gateway")
        .await
        .unwrap();
    assert_eq!(refund.status, TransactionStatus::Failed);
    assert_eq!(refund.refund_of.as_deref(), Some(original.external_ref.as_str()));
}

#[tokio::test]
async fn status_query_resolves_a_pending_transaction() {
    let h = setup("ALWAYS_SUCCESS");
    let pending = h.service.process_payment(&order(), &h.method_id, &HashMap::new()).await.unwrap();

    let resolved = h
        .service
        .check_payment_status(Some(pending.transaction_id), None)
        .await
        .unwrap();
    assert_eq!(resolved.status, TransactionStatus::Success);
    assert_eq!(h.gateway.network_call_count(), 1);
}

#[tokio::test]
async fn status_query_maps_cancel_codes() {
    let h = setup("QUERY_CANCELLED");
    let pending = h.service.process_payment(&order(), &h.method_id, &HashMap::new()).await.unwrap();

    let resolved = h
        .service
        .check_payment_status(None, Some(&pending.external_ref))
        .await
        .unwrap();
    assert_eq!(resolved.status, TransactionStatus::Cancelled);
}

#[tokio::test]
async fn status_query_network_failure_is_recoverable_and_mutates_nothing() {
    let h = setup("NETWORK_ERROR");
    let pending = h.service.process_payment(&order(), &h.method_id, &HashMap::new()).await.unwrap();

    let err = h
        .service
        .check_payment_status(Some(pending.transaction_id), None)
        .await
        .unwrap_err();
    match err {
        PaymentError::Gateway { message, kind } => {
            assert_eq!(kind, GatewayErrorKind::Network);
            assert!(message.contains("unable to check payment status"));
        }
        other => panic!("expected gateway error, got {other:?}"),
    }

    let stored = h.store.by_external_ref(&pending.external_ref).await.unwrap().unwrap();
    assert_eq!(stored.status, TransactionStatus::PendingUserAction);
}

#[tokio::test]
async fn status_query_short_circuits_on_terminal_state() {
    let h = setup("NETWORK_ERROR");
    let paid = paid_transaction(&h).await;

    let resolved = h
        .service
        .check_payment_status(Some(paid.transaction_id), None)
        .await
        .unwrap();
    assert_eq!(resolved.status, TransactionStatus::Success);
    assert_eq!(h.gateway.network_call_count(), 0);
}

#[tokio::test]
async fn status_query_for_unknown_transaction_is_not_found() {
    let h = setup("QUERY_NOT_FOUND");
    let err = h
        .service
        .check_payment_status(None, Some("ORDER999-deadbeef"))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::NotFound(_)));
}
