use crate::config::StatusCodeMap;
use crate::domain::method::MethodRegistry;
use crate::domain::order::OrderSnapshot;
use crate::domain::transaction::{PaymentTransaction, TransactionStatus};
use crate::error::PaymentError;
use crate::gateway::{fields, PaymentGateway};
use crate::metrics::{MetricsSink, OperationKind, PaymentEvent};
use crate::store::{TransactionStore, TransactionUpdate};
use crate::strategy::PaymentStrategy;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

#[derive(Clone)]
pub struct PaymentService {
    pub gateway: Arc<dyn PaymentGateway>,
    pub store: Arc<dyn TransactionStore>,
    pub methods: MethodRegistry,
    pub status_codes: StatusCodeMap,
    pub metrics: Arc<dyn MetricsSink>,
    pub callback_max_age_minutes: Option<i64>,
    pub gateway_utc_offset_hours: i32,
}

impl PaymentService {
    pub async fn process_payment(
        &self,
        order: &OrderSnapshot,
        payment_method_id: &str,
        client_params: &HashMap<String, String>,
    ) -> Result<PaymentTransaction, PaymentError> {
        let started = Instant::now();
        let result = self.initiate(order, payment_method_id, client_params).await;
        self.emit(OperationKind::Initiation, &result, started, Some(order.order_id.as_str()));
        result
    }

    async fn initiate(
        &self,
        order: &OrderSnapshot,
        payment_method_id: &str,
        client_params: &HashMap<String, String>,
    ) -> Result<PaymentTransaction, PaymentError> {
        order.validate()?;
        if payment_method_id.trim().is_empty() {
            return Err(PaymentError::Validation("payment method id is required".to_string()));
        }
        let method = self
            .methods
            .get(payment_method_id)
            .ok_or_else(|| PaymentError::Validation(format!("unknown payment method {payment_method_id}")))?;

        if let Some(existing) = self.store.pending_for_order(&order.order_id).await? {
            tracing::info!(
                "order {} already has pending transaction {}, reusing",
                order.order_id,
                existing.external_ref
            );
            return Ok(existing);
        }

        let strategy = PaymentStrategy::for_method(method.method_type, self.gateway.clone())?;
        let redirect = strategy.process_payment(order, &method, client_params)?;

        let raw_payload = serde_json::json!({
            "payment_url": redirect.payment_url,
            "vnp_TxnRef": redirect.txn_ref,
        })
        .to_string();
        let txn = PaymentTransaction::pending_payment(
            &redirect.txn_ref,
            &order.order_id,
            order.amount,
            &method.method_id,
            Some(raw_payload),
        );

        match self.store.insert(txn.clone()).await {
            Ok(()) => {}
            Err(insert_err) => {
                // Lost the pending-slot race to a concurrent initiation.
                if let Some(existing) = self.store.pending_for_order(&order.order_id).await? {
                    tracing::info!(
                        "order {} claimed by concurrent transaction {}, reusing",
                        order.order_id,
                        existing.external_ref
                    );
                    return Ok(existing);
                }
                return Err(insert_err);
            }
        }

        tracing::info!(
            "initiated payment {} for order {} (ref {})",
            txn.transaction_id,
            order.order_id,
            txn.external_ref
        );
        Ok(txn)
    }

    pub async fn update_transaction_status_from_callback(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<PaymentTransaction, PaymentError> {
        let started = Instant::now();
        let result = self.apply_callback(params).await;
        self.emit(OperationKind::CallbackUpdate, &result, started, None);
        result
    }

    async fn apply_callback(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<PaymentTransaction, PaymentError> {
        if !self.gateway.validate_response_signature(params) {
            tracing::warn!("rejected gateway callback with missing or invalid signature");
            return Err(PaymentError::Security(
                "callback signature is missing or invalid".to_string(),
            ));
        }

        let callback = fields::parse_callback(params)?;
        self.enforce_callback_age(callback.pay_date.as_deref())?;

        let status = self.status_codes.classify(&callback.response_code);
        let raw_payload = serde_json::to_string(params)
            .map_err(|e| PaymentError::Validation(format!("unserializable callback payload: {e}")))?;

        let applied = self
            .store
            .apply_update(
                &callback.txn_ref,
                TransactionUpdate {
                    status,
                    gateway_transaction_no: callback.transaction_no.clone(),
                    raw_gateway_payload: Some(raw_payload),
                },
            )
            .await?;

        if applied.applied {
            tracing::info!(
                "callback moved transaction {} to {:?} (response code {})",
                callback.txn_ref,
                applied.transaction.status,
                callback.response_code
            );
        } else {
            tracing::info!(
                "duplicate callback for terminal transaction {} ignored, status remains {:?}",
                callback.txn_ref,
                applied.transaction.status
            );
        }
        Ok(applied.transaction)
    }

    fn enforce_callback_age(&self, pay_date: Option<&str>) -> Result<(), PaymentError> {
        let Some(max_age_minutes) = self.callback_max_age_minutes else {
            return Ok(());
        };
        let Some(pay_date) = pay_date else {
            return Ok(());
        };

        let paid_at = chrono::NaiveDateTime::parse_from_str(pay_date, fields::GATEWAY_DATE_FORMAT)
            .map_err(|_| PaymentError::Security(format!("unparseable callback pay date {pay_date}")))?;
        let gateway_now = (chrono::Utc::now()
            + chrono::Duration::hours(self.gateway_utc_offset_hours as i64))
        .naive_utc();
        let age = gateway_now - paid_at;

        if age > chrono::Duration::minutes(max_age_minutes) {
            return Err(PaymentError::Security(format!(
                "callback pay date {pay_date} is outside the accepted replay window"
            )));
        }
        Ok(())
    }

    pub async fn check_payment_status(
        &self,
        transaction_id: Option<Uuid>,
        external_ref: Option<&str>,
    ) -> Result<PaymentTransaction, PaymentError> {
        let started = Instant::now();
        let result = self.reconcile_status(transaction_id, external_ref).await;
        self.emit(OperationKind::StatusQuery, &result, started, None);
        result
    }

    async fn reconcile_status(
        &self,
        transaction_id: Option<Uuid>,
        external_ref: Option<&str>,
    ) -> Result<PaymentTransaction, PaymentError> {
        let txn = match (external_ref, transaction_id) {
            (Some(external_ref), _) => self.store.by_external_ref(external_ref).await?,
            (None, Some(id)) => self.store.by_transaction_id(id).await?,
            (None, None) => {
                return Err(PaymentError::Validation(
                    "a transaction id or external reference is required".to_string(),
                ))
            }
        }
        .ok_or_else(|| PaymentError::NotFound("no such transaction".to_string()))?;

        if txn.status.is_terminal() {
            return Ok(txn);
        }

        let txn_date = fields::format_gateway_time(txn.created_at, self.gateway_utc_offset_hours);
        let outcome = self
            .gateway
            .query_transaction_status(&txn.external_ref, &txn.order_id, &txn_date)
            .await
            .map_err(|e| match e {
                PaymentError::Gateway { message, kind } => PaymentError::Gateway {
                    message: format!("unable to check payment status: {message}"),
                    kind,
                },
                other => other,
            })?;

        let status = self.status_codes.classify(&outcome.response_code);
        let applied = self
            .store
            .apply_update(
                &txn.external_ref,
                TransactionUpdate {
                    status,
                    gateway_transaction_no: outcome.transaction_no.clone(),
                    raw_gateway_payload: Some(outcome.raw_payload),
                },
            )
            .await?;

        Ok(applied.transaction)
    }

    pub async fn process_refund(
        &self,
        original_txn_ref: &str,
        order: &OrderSnapshot,
        amount: i64,
        reason: &str,
    ) -> Result<PaymentTransaction, PaymentError> {
        let started = Instant::now();
        let result = self.refund(original_txn_ref, order, amount, reason).await;
        self.emit(OperationKind::Refund, &result, started, Some(order.order_id.as_str()));
        result
    }

    async fn refund(
        &self,
        original_txn_ref: &str,
        order: &OrderSnapshot,
        amount: i64,
        reason: &str,
    ) -> Result<PaymentTransaction, PaymentError> {
        if amount <= 0 {
            return Err(PaymentError::Validation("refund amount must be > 0".to_string()));
        }

        let original = self
            .store
            .by_external_ref(original_txn_ref)
            .await?
            .ok_or_else(|| PaymentError::NotFound(format!("no transaction with reference {original_txn_ref}")))?;

        if original.status != TransactionStatus::Success {
            return Err(PaymentError::Validation(format!(
                "only successful transactions can be refunded, {original_txn_ref} is {:?}",
                original.status
            )));
        }
        if amount > original.amount {
            return Err(PaymentError::Validation(format!(
                "refund amount {amount} exceeds original transaction amount {}",
                original.amount
            )));
        }

        let method = self.methods.get(&original.payment_method_id).ok_or_else(|| {
            PaymentError::Configuration(format!(
                "payment method {} is no longer registered",
                original.payment_method_id
            ))
        })?;
        let strategy = PaymentStrategy::for_method(method.method_type, self.gateway.clone())?;

        let outcome = strategy.process_refund(original_txn_ref, order, amount, reason).await?;

        let status = self.status_codes.classify(&outcome.response_code);
        let mut refund_txn = PaymentTransaction::refund(
            &outcome.request_ref,
            &original,
            amount,
            status,
            Some(outcome.raw_payload),
        );
        refund_txn.gateway_transaction_no = outcome.transaction_no;

        self.store.insert(refund_txn.clone()).await?;
        tracing::info!(
            "refund {} of {} against {} recorded as {:?}",
            refund_txn.external_ref,
            amount,
            original_txn_ref,
            refund_txn.status
        );
        Ok(refund_txn)
    }

    fn emit(
        &self,
        operation: OperationKind,
        result: &Result<PaymentTransaction, PaymentError>,
        started: Instant,
        order_id: Option<&str>,
    ) {
        let txn = result.as_ref().ok();
        self.metrics.record(PaymentEvent {
            operation,
            transaction_id: txn.map(|t| t.transaction_id),
            external_ref: txn.map(|t| t.external_ref.clone()),
            order_id: txn
                .map(|t| t.order_id.clone())
                .or_else(|| order_id.map(str::to_string)),
            success: result.is_ok(),
            duration_ms: started.elapsed().as_millis() as i64,
            timestamp: chrono::Utc::now(),
        });
    }
}
