use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use arka_catalog::ProductView;

use crate::error::LedgerError;
use crate::query::LowStockSource;

/// Snapshot of every product strictly below `threshold` at `generated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockReport {
    pub generated_at: DateTime<Utc>,
    pub threshold: i64,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("low stock query failed: {0}")]
    Source(#[from] LedgerError),

    #[error("report delivery failed: {0}")]
    Delivery(String),
}

/// Receives generated reports (renders, stores and/or sends them).
pub trait LowStockReportSink: Send + Sync + 'static {
    fn deliver(&self, report: LowStockReport) -> Result<(), ReportError>;
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryLowStockSink {
    inner: std::sync::Mutex<Vec<LowStockReport>>,
}

impl InMemoryLowStockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<LowStockReport> {
        self.inner.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl LowStockReportSink for InMemoryLowStockSink {
    fn deliver(&self, report: LowStockReport) -> Result<(), ReportError> {
        self.inner
            .lock()
            .map_err(|_| ReportError::Delivery("lock poisoned".to_string()))?
            .push(report);
        Ok(())
    }
}

/// Build a report for `threshold` now and hand it to `sink`.
///
/// The on-demand path; the runner uses it for every scheduled run. Returns the
/// report that was delivered.
pub fn generate_report<Q, K>(
    source: &Q,
    sink: &K,
    threshold: i64,
) -> Result<LowStockReport, ReportError>
where
    Q: LowStockSource + ?Sized,
    K: LowStockReportSink + ?Sized,
{
    let products = source.low_stock(threshold)?;
    let report = LowStockReport {
        generated_at: Utc::now(),
        threshold,
        products: products.iter().map(|p| p.view()).collect(),
    };
    sink.deliver(report.clone())?;
    Ok(report)
}

/// Config for the low-stock report runner.
#[derive(Debug, Clone)]
pub struct LowStockReportRunner {
    pub threshold: i64,
    pub interval: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for LowStockReportRunner {
    fn default() -> Self {
        Self {
            threshold: 10,
            interval: Duration::from_secs(15 * 60),
            max_retries: 5,
            base_backoff: Duration::from_millis(250),
        }
    }
}

/// Handle for the running report thread (shutdown + trigger hook).
#[derive(Debug)]
pub struct LowStockReportRunnerHandle {
    shutdown: mpsc::Sender<()>,
    trigger: mpsc::SyncSender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl LowStockReportRunnerHandle {
    /// Ask for a report outside the schedule.
    ///
    /// Triggers are coalesced: if one is already pending this is a no-op.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Stop the runner thread and wait for it.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl LowStockReportRunner {
    /// Spawn the runner thread.
    ///
    /// - Schedule: once on start, then every `interval`
    /// - Trigger: `handle.trigger()` requests an extra run
    /// - Failures: logged + retried with bounded exponential backoff; never propagate
    pub fn spawn<Q, K>(
        &self,
        name: &'static str,
        source: Arc<Q>,
        sink: Arc<K>,
    ) -> std::io::Result<LowStockReportRunnerHandle>
    where
        Q: LowStockSource,
        K: LowStockReportSink,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(1);

        let cfg = self.clone();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || runner_loop(name, cfg, shutdown_rx, trigger_rx, source, sink))?;

        Ok(LowStockReportRunnerHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            join: Some(join),
        })
    }
}

fn runner_loop<Q, K>(
    name: &'static str,
    cfg: LowStockReportRunner,
    shutdown_rx: mpsc::Receiver<()>,
    trigger_rx: mpsc::Receiver<()>,
    source: Arc<Q>,
    sink: Arc<K>,
) where
    Q: LowStockSource,
    K: LowStockReportSink,
{
    info!(runner = name, threshold = cfg.threshold, "low stock report runner started");

    let mut next_tick = Instant::now() + cfg.interval;
    let mut pending = true; // run once on startup
    let mut failures: u32 = 0;
    let mut backoff_until: Option<Instant> = None;

    loop {
        // Shutdown has priority.
        match shutdown_rx.try_recv() {
            Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
            Err(mpsc::TryRecvError::Empty) => {}
        }

        let now = Instant::now();
        if now >= next_tick {
            pending = true;
            // Keep a stable cadence even if we were delayed.
            while next_tick <= now {
                next_tick += cfg.interval;
            }
        }

        while trigger_rx.try_recv().is_ok() {
            pending = true;
        }

        if let Some(until) = backoff_until {
            if Instant::now() < until {
                thread::sleep(Duration::from_millis(50));
                continue;
            }
            backoff_until = None;
        }

        if !pending {
            let sleep_for = next_tick
                .saturating_duration_since(Instant::now())
                .min(Duration::from_millis(250));
            thread::sleep(sleep_for);
            continue;
        }

        pending = false;

        match generate_report(source.as_ref(), sink.as_ref(), cfg.threshold) {
            Ok(report) => {
                failures = 0;
                info!(
                    runner = name,
                    products = report.products.len(),
                    "low stock report delivered"
                );
            }
            Err(e) => {
                warn!(runner = name, error = %e, "low stock report failed");
                failures += 1;
                if failures <= cfg.max_retries {
                    pending = true;
                    backoff_until = Some(Instant::now() + backoff(cfg.base_backoff, failures));
                } else {
                    failures = 0;
                }
            }
        }
    }

    info!(runner = name, "low stock report runner stopped");
}

fn backoff(base: Duration, attempt: u32) -> Duration {
    // base * 2^(attempt-1), capped at 10s.
    let pow = 1u32 << attempt.saturating_sub(1).min(10);
    let ms = base.as_millis().saturating_mul(pow as u128);
    Duration::from_millis(ms.min(10_000) as u64)
}
