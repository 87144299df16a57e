//! Stale relay session cleanup.

use std::time::Duration;

use crate::adapter::WalletAdapter;
use crate::observability::metrics;

/// What one recovery run removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub first_purge: usize,
    pub second_purge: usize,
}

impl RecoveryReport {
    pub fn keys_removed(&self) -> usize {
        self.first_purge + self.second_purge
    }
}

/// Purge, let the transport settle, purge again.
///
/// Every step is best-effort; adapters swallow their own failures. Running
/// twice leaves the same end state as running once.
#[derive(Debug, Clone)]
pub struct StaleSessionRecovery {
    settle_delay: Duration,
}

impl StaleSessionRecovery {
    pub fn new(settle_delay: Duration) -> Self {
        Self { settle_delay }
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub async fn run(&self, adapter: &dyn WalletAdapter) -> RecoveryReport {
        tracing::warn!(kind = %adapter.kind(), "Running stale session recovery");
        metrics::record_session_recovery(adapter.kind());

        adapter.unsubscribe_all();
        adapter.disconnect().await;
        let first_purge = adapter.force_cleanup().await;

        tokio::time::sleep(self.settle_delay).await;

        let second_purge = adapter.force_cleanup().await;
        let report = RecoveryReport {
            first_purge,
            second_purge,
        };
        tracing::info!(
            first_purge = report.first_purge,
            second_purge = report.second_purge,
            "Stale session recovery complete"
        );
        report
    }
}

impl Default for StaleSessionRecovery {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{ChangeHandlers, ProviderKind, WalletInfo, WalletResult};
    use alloy::primitives::U256;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        steps: Mutex<Vec<&'static str>>,
        leftover: Mutex<usize>,
    }

    #[async_trait]
    impl WalletAdapter for Recorder {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Relay
        }

        async fn connect(&self) -> WalletResult<WalletInfo> {
            unreachable!()
        }

        async fn disconnect(&self) {
            self.steps.lock().unwrap().push("disconnect");
        }

        async fn query_info(&self) -> WalletResult<Option<WalletInfo>> {
            Ok(None)
        }

        fn subscribe_changes(&self, _handlers: ChangeHandlers) {}

        fn unsubscribe_all(&self) {
            self.steps.lock().unwrap().push("unsubscribe");
        }

        async fn fetch_gas_price(&self) -> WalletResult<U256> {
            Ok(U256::ZERO)
        }

        async fn force_cleanup(&self) -> usize {
            self.steps.lock().unwrap().push("purge");
            std::mem::take(&mut *self.leftover.lock().unwrap())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_wait_purge() {
        let adapter = Recorder::default();
        *adapter.leftover.lock().unwrap() = 4;
        let recovery = StaleSessionRecovery::new(Duration::from_millis(1000));

        let started = tokio::time::Instant::now();
        let report = recovery.run(&adapter).await;

        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert_eq!(report, RecoveryReport { first_purge: 4, second_purge: 0 });
        assert_eq!(
            *adapter.steps.lock().unwrap(),
            vec!["unsubscribe", "disconnect", "purge", "purge"]
        );

        let again = recovery.run(&adapter).await;
        assert_eq!(again.keys_removed(), 0);
    }
}
