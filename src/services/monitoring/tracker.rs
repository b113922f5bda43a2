// スループット計測
// エンジンごとに1つ所有され、報告間隔ごとにスナップショットを作る

use crate::core::{ThroughputSnapshot, WriteBackStats};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// 累積カウンタと報告間隔ごとの処理速度
#[derive(Debug, Clone)]
pub struct ThroughputTracker {
    interval: Duration,
    started: Instant,
    started_at: DateTime<Utc>,
    last_tick: Instant,
    processed_at_last_tick: u64,
    rate_per_second: f64,
    processed: u64,
    resolved: u64,
    errors: u64,
    write_succeeded: u64,
    write_failed: u64,
}

impl ThroughputTracker {
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    /// 計測開始時刻を指定して作成（テストで時刻を注入する場合）
    pub fn starting_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            started: start,
            started_at: Utc::now(),
            last_tick: start,
            processed_at_last_tick: 0,
            rate_per_second: 0.0,
            processed: 0,
            resolved: 0,
            errors: 0,
            write_succeeded: 0,
            write_failed: 0,
        }
    }

    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    pub fn record_resolved(&mut self) {
        self.resolved += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn record_write_back(&mut self, stats: WriteBackStats) {
        self.write_succeeded += stats.succeeded as u64;
        self.write_failed += stats.failed as u64;
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// 前回の報告から`interval`以上経っていれば速度を更新してスナップショットを返す
    pub fn tick(&mut self, now: Instant) -> Option<ThroughputSnapshot> {
        let window = now.saturating_duration_since(self.last_tick);
        if window < self.interval {
            return None;
        }

        let secs = window.as_secs_f64();
        if secs > 0.0 {
            let delta = self.processed - self.processed_at_last_tick;
            self.rate_per_second = delta as f64 / secs;
        }
        self.last_tick = now;
        self.processed_at_last_tick = self.processed;

        Some(self.snapshot_at(now))
    }

    pub fn snapshot(&self) -> ThroughputSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> ThroughputSnapshot {
        ThroughputSnapshot {
            processed_total: self.processed,
            resolved_total: self.resolved,
            error_total: self.errors,
            write_succeeded: self.write_succeeded,
            write_failed: self.write_failed,
            rate_per_second: self.rate_per_second,
            started_at: self.started_at,
            elapsed: now.saturating_duration_since(self.started),
        }
    }
}
