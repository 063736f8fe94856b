//! Ledger configuration.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use crate::reporting::LowStockReportRunner;

pub const LOW_STOCK_THRESHOLD_VAR: &str = "ARKA_LOW_STOCK_THRESHOLD";
pub const REPORT_INTERVAL_SECS_VAR: &str = "ARKA_REPORT_INTERVAL_SECS";
pub const REPORT_MAX_RETRIES_VAR: &str = "ARKA_REPORT_MAX_RETRIES";
pub const REPORT_BACKOFF_MS_VAR: &str = "ARKA_REPORT_BACKOFF_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Products strictly below this quantity are reported.
    pub low_stock_threshold: i64,
    pub report_interval: Duration,
    pub report_max_retries: u32,
    pub report_base_backoff: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10,
            report_interval: Duration::from_secs(15 * 60),
            report_max_retries: 5,
            report_base_backoff: Duration::from_millis(250),
        }
    }
}

impl LedgerConfig {
    /// Load from `ARKA_*` environment variables; unset ones keep the default.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = parse::<i64, _>(&lookup, LOW_STOCK_THRESHOLD_VAR)? {
            cfg.low_stock_threshold = v;
        }
        if let Some(v) = parse::<u64, _>(&lookup, REPORT_INTERVAL_SECS_VAR)? {
            anyhow::ensure!(v > 0, "{REPORT_INTERVAL_SECS_VAR} must be positive");
            cfg.report_interval = Duration::from_secs(v);
        }
        if let Some(v) = parse::<u32, _>(&lookup, REPORT_MAX_RETRIES_VAR)? {
            cfg.report_max_retries = v;
        }
        if let Some(v) = parse::<u64, _>(&lookup, REPORT_BACKOFF_MS_VAR)? {
            cfg.report_base_backoff = Duration::from_millis(v);
        }

        Ok(cfg)
    }

    pub fn report_runner(&self) -> LowStockReportRunner {
        LowStockReportRunner {
            threshold: self.low_stock_threshold,
            interval: self.report_interval,
            max_retries: self.report_max_retries,
            base_backoff: self.report_base_backoff,
        }
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
    }
}
