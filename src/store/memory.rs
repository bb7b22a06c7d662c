use crate::domain::transaction::{PaymentTransaction, TransactionStatus, TransactionType};
use crate::error::PaymentError;
use crate::store::{AppliedUpdate, TransactionStore, TransactionUpdate};
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryTransactionStore {
    by_external_ref: DashMap<String, PaymentTransaction>,
    by_transaction_id: DashMap<Uuid, String>,
    pending_by_order: DashMap<String, String>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, txn: PaymentTransaction) -> Result<(), PaymentError> {
        let claims_pending_slot = txn.transaction_type == TransactionType::Payment
            && txn.status == TransactionStatus::PendingUserAction;

        if claims_pending_slot {
            match self.pending_by_order.entry(txn.order_id.clone()) {
                dashmap::mapref::entry::Entry::Occupied(mut slot) => {
                    let still_pending = self
                        .by_external_ref
                        .get(slot.get())
                        .is_some_and(|t| t.status == TransactionStatus::PendingUserAction);
                    if still_pending {
                        return Err(PaymentError::Validation(format!(
                            "order {} already has a pending payment transaction",
                            txn.order_id
                        )));
                    }
                    slot.insert(txn.external_ref.clone());
                }
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    slot.insert(txn.external_ref.clone());
                }
            }
        }

        match self.by_external_ref.entry(txn.external_ref.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                if claims_pending_slot {
                    self.pending_by_order.remove_if(&txn.order_id, |_, r| r == &txn.external_ref);
                }
                return Err(PaymentError::Validation(format!(
                    "transaction reference {} already exists",
                    txn.external_ref
                )));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(txn.clone());
            }
        }

        self.by_transaction_id.insert(txn.transaction_id, txn.external_ref.clone());
        Ok(())
    }

    async fn by_external_ref(&self, external_ref: &str) -> Result<Option<PaymentTransaction>, PaymentError> {
        Ok(self.by_external_ref.get(external_ref).map(|t| t.clone()))
    }

    async fn by_transaction_id(&self, transaction_id: Uuid) -> Result<Option<PaymentTransaction>, PaymentError> {
        let external_ref = match self.by_transaction_id.get(&transaction_id) {
            Some(r) => r.clone(),
            None => return Ok(None),
        };
        Ok(self.by_external_ref.get(&external_ref).map(|t| t.clone()))
    }

    async fn pending_for_order(&self, order_id: &str) -> Result<Option<PaymentTransaction>, PaymentError> {
        let external_ref = match self.pending_by_order.get(order_id) {
            Some(r) => r.clone(),
            None => return Ok(None),
        };
        let pending = self
            .by_external_ref
            .get(&external_ref)
            .map(|t| t.clone())
            .filter(|t| t.status == TransactionStatus::PendingUserAction);
        if pending.is_none() {
            self.pending_by_order.remove_if(order_id, |_, r| r == &external_ref);
        }
        Ok(pending)
    }

    async fn apply_update(
        &self,
        external_ref: &str,
        update: TransactionUpdate,
    ) -> Result<AppliedUpdate, PaymentError> {
        let snapshot = {
            let mut entry = self
                .by_external_ref
                .get_mut(external_ref)
                .ok_or_else(|| PaymentError::NotFound(format!("no transaction with reference {external_ref}")))?;

            if entry.status.is_terminal() {
                return Ok(AppliedUpdate {
                    transaction: entry.clone(),
                    applied: false,
                });
            }

            entry.status = update.status;
            if update.gateway_transaction_no.is_some() {
                entry.gateway_transaction_no = update.gateway_transaction_no;
            }
            if update.raw_gateway_payload.is_some() {
                entry.raw_gateway_payload = update.raw_gateway_payload;
            }
            entry.updated_at = chrono::Utc::now();
            entry.clone()
        };

        if snapshot.status.is_terminal() {
            self.pending_by_order
                .remove_if(&snapshot.order_id, |_, r| r == &snapshot.external_ref);
        }

        Ok(AppliedUpdate {
            transaction: snapshot,
            applied: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(external_ref: &str, order_id: &str) -> PaymentTransaction {
        PaymentTransaction::pending_payment(external_ref, order_id, 250_000, "m1", None)
    }

    fn update(status: TransactionStatus) -> TransactionUpdate {
        TransactionUpdate {
            status,
            gateway_transaction_no: Some("14421".to_string()),
            raw_gateway_payload: None,
        }
    }

    #[tokio::test]
    async fn duplicate_reference_is_rejected() {
        let store = InMemoryTransactionStore::new();
        store.insert(pending("REF-1", "O1")).await.unwrap();
        assert!(store.insert(pending("REF-1", "O1")).await.is_err());
    }

    #[tokio::test]
    async fn terminal_state_is_entered_exactly_once() {
        let store = InMemoryTransactionStore::new();
        store.insert(pending("REF-1", "O1")).await.unwrap();

        let first = store.apply_update("REF-1", update(TransactionStatus::Success)).await.unwrap();
        assert!(first.applied);
        assert_eq!(first.transaction.status, TransactionStatus::Success);

        let second = store.apply_update("REF-1", update(TransactionStatus::Failed)).await.unwrap();
        assert!(!second.applied);
        assert_eq!(second.transaction.status, TransactionStatus::Success);
        assert_eq!(second.transaction.updated_at, first.transaction.updated_at);
    }

    #[tokio::test]
    async fn pending_index_clears_on_terminal_update() {
        let store = InMemoryTransactionStore::new();
        store.insert(pending("REF-1", "O1")).await.unwrap();
        assert!(store.pending_for_order("O1").await.unwrap().is_some());

        store.apply_update("REF-1", update(TransactionStatus::Cancelled)).await.unwrap();
        assert!(store.pending_for_order("O1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let store = InMemoryTransactionStore::new();
        let err = store.apply_update("missing", update(TransactionStatus::Success)).await.unwrap_err();
        assert!(matches!(err, PaymentError::NotFound(_)));
    }
}
