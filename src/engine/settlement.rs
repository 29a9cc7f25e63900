use tracing::{error, warn};
use ulid::Ulid;

use crate::model::*;
use crate::observability;
use crate::store::ScheduleStore;

use super::{Engine, EngineError};

impl<S: ScheduleStore> Engine<S> {
    /// Mark a transaction COMPLETED and transfer its bank-hours from
    /// consumer to provider.
    ///
    /// The consumer debit is floored at zero; the provider credit is exact.
    /// If the status write lands but a balance write then fails, the
    /// divergence is logged at error severity and surfaced as
    /// `SettlementInconsistency` — it is never swallowed.
    pub async fn complete_transaction(&self, id: Ulid) -> Result<Transaction, EngineError> {
        let mut tx = self.store().get_transaction(id).await?;
        if tx.status != TransactionStatus::Pending {
            return Err(EngineError::InvalidInput("transaction is not pending"));
        }

        tx.status = TransactionStatus::Completed;
        let tx = self.store().update_transaction(tx).await?;

        if let Err(e) = self.apply_balance_delta(tx.consumer_id, -tx.hours_spent).await {
            error!(
                transaction = %tx.id,
                consumer = %tx.consumer_id,
                hours = tx.hours_spent,
                cause = %e,
                "settlement inconsistency: status COMPLETED but consumer debit failed"
            );
            metrics::counter!(observability::SETTLEMENT_FAILURES_TOTAL).increment(1);
            return Err(EngineError::SettlementInconsistency(tx.id));
        }
        if let Err(e) = self.apply_balance_delta(tx.provider_id, tx.hours_spent).await {
            error!(
                transaction = %tx.id,
                provider = %tx.provider_id,
                hours = tx.hours_spent,
                cause = %e,
                "settlement inconsistency: consumer debited but provider credit failed"
            );
            metrics::counter!(observability::SETTLEMENT_FAILURES_TOTAL).increment(1);
            return Err(EngineError::SettlementInconsistency(tx.id));
        }

        Ok(tx)
    }

    /// Conditional balance write keyed on the user's version. On a version
    /// conflict the write is retried exactly once against a fresh read
    /// before the error is surfaced.
    pub(super) async fn apply_balance_delta(
        &self,
        user_id: Ulid,
        delta: f64,
    ) -> Result<User, EngineError> {
        let user = self.store().get_user(user_id).await?;
        match self
            .store()
            .update_user_balance(user_id, delta, user.version)
            .await
        {
            Err(EngineError::ConcurrentModification(_)) => {
                warn!(user = %user_id, "balance version conflict, retrying once");
                metrics::counter!(observability::BALANCE_RETRIES_TOTAL).increment(1);
                let fresh = self.store().get_user(user_id).await?;
                self.store()
                    .update_user_balance(user_id, delta, fresh.version)
                    .await
            }
            other => other,
        }
    }
}
