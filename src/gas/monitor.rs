//! Background gas price polling.
//!
//! One poll task per active session. Each start bumps a generation counter
//! and creates a fresh cancellation token; a fetch applies its result only
//! if both still match under the same lock `stop` takes, so a fetch that
//! was in flight during teardown discards its own result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use alloy::primitives::U256;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::adapter::{WalletAdapter, WalletResult};
use crate::config::GasConfig;
use crate::gas::format::{format_gwei, now_timestamp, parse_gwei};
use crate::gas::types::GasPriceInfo;
use crate::observability::metrics;

struct ActivePoll {
    generation: u64,
    token: CancellationToken,
    adapter: Arc<dyn WalletAdapter>,
    /// Pending debounced refresh, if any.
    refresh: Option<CancellationToken>,
}

struct MonitorInner {
    info: watch::Sender<GasPriceInfo>,
    generation: AtomicU64,
    active: Mutex<Option<ActivePoll>>,
    poll_interval: Duration,
    refresh_debounce: Duration,
}

/// Polls the active adapter for fee data while a session is connected.
#[derive(Clone)]
pub struct GasPriceMonitor {
    inner: Arc<MonitorInner>,
}

impl GasPriceMonitor {
    pub fn new(config: &GasConfig) -> Self {
        Self::with_intervals(config.poll_interval(), config.refresh_debounce())
    }

    pub fn with_intervals(poll_interval: Duration, refresh_debounce: Duration) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                info: watch::Sender::new(GasPriceInfo::default()),
                generation: AtomicU64::new(0),
                active: Mutex::new(None),
                poll_interval,
                refresh_debounce,
            }),
        }
    }

    /// Begin polling `adapter`: one fetch now, then one per interval.
    ///
    /// Replaces any poll already running.
    pub fn start(&self, adapter: Arc<dyn WalletAdapter>) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        {
            let mut active = self.inner.lock_active();
            if let Some(previous) = active.take() {
                previous.token.cancel();
            }
            *active = Some(ActivePoll {
                generation,
                token: token.clone(),
                adapter: adapter.clone(),
                refresh: None,
            });
        }

        tracing::info!(
            generation,
            interval_ms = self.inner.poll_interval.as_millis() as u64,
            "Gas price monitoring started"
        );
        tokio::spawn(poll_loop(self.inner.clone(), adapter, generation, token));
    }

    /// Cancel polling and reset the quote to its empty state.
    ///
    /// Returns false if nothing was running; the quote is reset regardless.
    pub fn stop(&self) -> bool {
        let mut active = self.inner.lock_active();
        let stopped = active.take();
        if let Some(poll) = &stopped {
            poll.token.cancel();
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            tracing::info!(generation = poll.generation, "Gas price monitoring stopped");
        }
        self.inner.info.send_replace(GasPriceInfo::default());
        drop(active);
        stopped.is_some()
    }

    /// Request an out-of-schedule fetch.
    ///
    /// Requests closer together than the debounce window collapse into one
    /// fetch, issued once the window passes without a newer request.
    /// Returns false without fetching when no session is active.
    pub fn request_refresh(&self) -> bool {
        let mut active = self.inner.lock_active();
        let Some(poll) = active.as_mut() else {
            tracing::debug!("Gas refresh ignored, no active session");
            return false;
        };

        if let Some(pending) = poll.refresh.take() {
            pending.cancel();
        }
        let pending = poll.token.child_token();
        poll.refresh = Some(pending.clone());

        let inner = self.inner.clone();
        let adapter = poll.adapter.clone();
        let generation = poll.generation;
        let token = poll.token.clone();
        let debounce = self.inner.refresh_debounce;
        drop(active);

        tokio::spawn(async move {
            tokio::select! {
                _ = pending.cancelled() => {}
                _ = tokio::time::sleep(debounce) => {
                    inner.fetch_once(adapter.as_ref(), generation, &token).await;
                }
            }
        });
        true
    }

    pub fn is_monitoring(&self) -> bool {
        self.inner.lock_active().is_some()
    }

    pub fn snapshot(&self) -> GasPriceInfo {
        self.inner.info.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GasPriceInfo> {
        self.inner.info.subscribe()
    }

    pub fn clear_error(&self) {
        self.inner.info.send_if_modified(|info| info.error.take().is_some());
    }
}

impl std::fmt::Debug for GasPriceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GasPriceMonitor")
            .field("generation", &self.inner.generation.load(Ordering::SeqCst))
            .field("poll_interval", &self.inner.poll_interval)
            .field("refresh_debounce", &self.inner.refresh_debounce)
            .finish()
    }
}

impl MonitorInner {
    fn lock_active(&self) -> MutexGuard<'_, Option<ActivePoll>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True if `generation`/`token` still identify the running poll.
    fn is_current(active: &Option<ActivePoll>, generation: u64, token: &CancellationToken) -> bool {
        !token.is_cancelled() && active.as_ref().is_some_and(|poll| poll.generation == generation)
    }

    /// Fetch once and apply the result if the poll is still current.
    async fn fetch_once(&self, adapter: &dyn WalletAdapter, generation: u64, token: &CancellationToken) -> bool {
        {
            let active = self.lock_active();
            if !Self::is_current(&active, generation, token) {
                return false;
            }
            self.info.send_modify(|info| {
                info.is_loading = true;
                info.error = None;
            });
        }

        let result = adapter.fetch_gas_price().await;

        let active = self.lock_active();
        if !Self::is_current(&active, generation, token) {
            tracing::debug!(generation, "Discarding gas price from a stale poll");
            metrics::record_gas_fetch("discarded");
            return false;
        }
        self.apply(result);
        true
    }

    fn apply(&self, result: WalletResult<U256>) {
        match result {
            Ok(wei) => {
                let fee_gwei = format_gwei(wei);
                tracing::debug!(gwei = %fee_gwei, "Gas price updated");
                metrics::record_gas_fetch("success");
                if let Some(value) = parse_gwei(&fee_gwei) {
                    metrics::record_gas_price_gwei(value);
                }
                self.info.send_replace(GasPriceInfo {
                    fee_wei: wei.to_string(),
                    fee_gwei,
                    last_updated: now_timestamp(),
                    is_loading: false,
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Gas price fetch failed");
                metrics::record_gas_fetch("failure");
                self.info.send_modify(|info| {
                    info.is_loading = false;
                    info.error = Some(e.to_string());
                });
            }
        }
    }
}

async fn poll_loop(inner: Arc<MonitorInner>, adapter: Arc<dyn WalletAdapter>, generation: u64, token: CancellationToken) {
    let mut ticker = tokio::time::interval(inner.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        inner.fetch_once(adapter.as_ref(), generation, &token).await;
    }
    tracing::debug!(generation, "Gas poll loop exited");
}
