// BulkDehashEngine - ストア上の未処理レコードを一括で逆引きする
//
// Fetching → Resolving → WritingBack → Fetching を繰り返し、
// キャンセルまたは致命的エラーで終了する。接続はどの終了経路でも解放される。

use crate::{
    core::{
        DehashConfig, DehashResult, LookupClient, ProgressReporter, Record, RecordSource,
        ThroughputSnapshot, WriteBackStats,
    },
    services::monitoring::ThroughputTracker,
};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// エンジンの現在の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkState {
    Fetching,
    Resolving,
    WritingBack,
    Interrupted,
    Failed,
}

/// 実行結果の種別
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    /// キャンセルされ、1件以上処理済み
    Interrupted,
    /// キャンセルされたが1件も処理していない
    NothingProcessed,
    /// 処理できるレコードが尽きた（stop_when_drained時のみ）
    Drained,
    /// 致命的エラーで中断
    Failed { subject: String, message: String },
}

#[derive(Debug, Clone)]
pub struct BulkRunReport {
    pub outcome: BulkOutcome,
    pub snapshot: ThroughputSnapshot,
    pub batches: u64,
}

impl BulkRunReport {
    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            BulkOutcome::Interrupted | BulkOutcome::Drained => 0,
            BulkOutcome::NothingProcessed | BulkOutcome::Failed { .. } => 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == 0
    }
}

/// 一括逆引きエンジン
///
/// ルックアップ接続とストアクライアントはエンジンが排他的に所有する。
/// キャンセルは取得前・レコード間・取得待ちの間に確認し、
/// 実行中のresolveは完了を待つ。
pub struct BulkDehashEngine<L, S, C, R> {
    lookup: L,
    store: S,
    config: C,
    reporter: R,
    cancel: CancellationToken,
    tracker: ThroughputTracker,
    state: BulkState,
    batches: u64,
    closed: bool,
}

impl<L, S, C, R> BulkDehashEngine<L, S, C, R>
where
    L: LookupClient,
    S: RecordSource,
    C: DehashConfig,
    R: ProgressReporter,
{
    pub fn new(lookup: L, store: S, config: C, reporter: R, cancel: CancellationToken) -> Self {
        let tracker = ThroughputTracker::new(config.report_interval());
        Self {
            lookup,
            store,
            config,
            reporter,
            cancel,
            tracker,
            state: BulkState::Fetching,
            batches: 0,
            closed: false,
        }
    }

    pub fn state(&self) -> BulkState {
        self.state
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 終了条件に達するまで処理を続け、接続を解放して結果を返す
    pub async fn run(&mut self) -> BulkRunReport {
        self.reporter.report_started("bulk dehash").await;

        let outcome = self.drive().await;
        self.shutdown().await;

        let snapshot = self.tracker.snapshot();
        let outcome = match outcome {
            BulkOutcome::Interrupted if snapshot.processed_total == 0 => BulkOutcome::NothingProcessed,
            other => other,
        };

        self.state = match outcome {
            BulkOutcome::Failed { .. } => BulkState::Failed,
            _ => BulkState::Interrupted,
        };

        self.reporter.report_completed(&snapshot).await;

        info!(
            outcome = ?outcome,
            batches = self.batches,
            processed = snapshot.processed_total,
            resolved = snapshot.resolved_total,
            "bulk run finished"
        );

        BulkRunReport {
            outcome,
            snapshot,
            batches: self.batches,
        }
    }

    async fn drive(&mut self) -> BulkOutcome {
        loop {
            self.state = BulkState::Fetching;
            if self.cancel.is_cancelled() {
                return BulkOutcome::Interrupted;
            }

            let batch = match self.fetch_batch().await {
                Ok(Some(batch)) => batch,
                Ok(None) => return BulkOutcome::Interrupted,
                Err(e) => {
                    error!(error = %e, severity = e.severity().as_str(), "fetch failed");
                    self.reporter.report_error("store fetch", &e).await;
                    return BulkOutcome::Failed {
                        subject: "fetch".to_string(),
                        message: e.to_string(),
                    };
                }
            };

            if batch.is_empty() {
                if self.config.stop_when_drained() {
                    return BulkOutcome::Drained;
                }
                debug!(delay = ?self.config.idle_delay(), "no unresolved records, waiting");
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return BulkOutcome::Interrupted,
                    _ = tokio::time::sleep(self.config.idle_delay()) => continue,
                }
            }

            self.batches += 1;
            info!(batch = self.batches, records = batch.len(), "batch fetched");

            self.state = BulkState::Resolving;
            let (resolved, stop) = self.resolve_batch(batch).await;

            self.state = BulkState::WritingBack;
            let written = self.write_back(&resolved).await;
            self.report_tick().await;

            if let Some(outcome) = stop {
                return outcome;
            }

            // 1件も書き戻せなかった場合、次の取得でも同じレコードが返る
            if written.succeeded == 0 && self.config.stop_when_drained() {
                info!("batch made no progress, stopping");
                return BulkOutcome::Drained;
            }
        }
    }

    /// 1バッチ取得（Noneは取得待ち中のキャンセル）
    ///
    /// 再試行するのは回復可能なエラー（タイムアウト）のみ。
    async fn fetch_batch(&mut self) -> DehashResult<Option<Vec<Record>>> {
        let policy = self.config.fetch_retry_policy();
        let limit = self.config.batch_size();
        let mut retries = 0u32;

        loop {
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(None),
                result = self.store.fetch_unresolved_batch(limit) => result,
            };

            match result {
                Ok(batch) => return Ok(Some(batch)),
                Err(e) if e.is_recoverable() => {
                    if !policy.allows_retry(retries) {
                        return Err(e);
                    }
                    retries += 1;
                    warn!(retries, error = %e, "store fetch timed out, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 解決できたレコードと、途中終了した場合の結果を返す
    async fn resolve_batch(&mut self, batch: Vec<Record>) -> (Vec<Record>, Option<BulkOutcome>) {
        let mut resolved = Vec::new();

        for mut record in batch {
            if self.cancel.is_cancelled() {
                info!(resolved = resolved.len(), "cancelled mid-batch");
                return (resolved, Some(BulkOutcome::Interrupted));
            }

            self.tracker.record_processed();
            match self.lookup.resolve(&record.digest).await {
                Ok(resolution) => match resolution.into_text() {
                    Ok(Some(plaintext)) => {
                        record.plaintext = Some(plaintext);
                        self.tracker.record_resolved();
                        resolved.push(record);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        // UTF-8でない平文は未発見扱い
                        debug!(digest = %record.digest, error = %e, "undecodable plaintext");
                    }
                },
                Err(e) if e.is_protocol() => {
                    self.tracker.record_error();
                    error!(
                        digest = %record.digest,
                        error = %e,
                        severity = e.severity().as_str(),
                        "lookup failed"
                    );
                    self.reporter
                        .report_error(&format!("hash {}", record.digest), &e)
                        .await;
                    return (
                        resolved,
                        Some(BulkOutcome::Failed {
                            subject: record.digest,
                            message: e.to_string(),
                        }),
                    );
                }
                Err(e) => {
                    self.tracker.record_error();
                    warn!(digest = %record.digest, error = %e, "record skipped");
                }
            }

            self.report_tick().await;
        }

        (resolved, None)
    }

    async fn write_back(&mut self, resolved: &[Record]) -> WriteBackStats {
        if resolved.is_empty() {
            return WriteBackStats::default();
        }

        let stats = match self.store.write_back_batch(resolved).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(submitted = resolved.len(), error = %e, "write-back failed");
                WriteBackStats::all_failed(resolved.len())
            }
        };

        info!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            "write-back finished"
        );
        self.tracker.record_write_back(stats);
        stats
    }

    async fn report_tick(&mut self) {
        if let Some(snapshot) = self.tracker.tick(Instant::now()) {
            self.reporter.report_progress(&snapshot).await;
        }
    }

    async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.lookup.close().await;
        self.store.close().await;
        self.closed = true;
        debug!("lookup connection and store client released");
    }
}
