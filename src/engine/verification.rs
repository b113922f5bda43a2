// VerificationEngine - ワードリストの候補語でルックアップテーブルを検証する

use crate::{
    core::{
        Candidate, CandidateSource, Classification, DehashConfig, DehashError, DehashResult,
        LookupClient, ProgressReporter, Resolution, ThroughputSnapshot,
    },
    services::{digest::HashAlgorithm, monitoring::ThroughputTracker},
};
use futures::stream::{self, Stream};
use std::time::Instant;
use tracing::{debug, error, warn};

/// 候補語1件の分類結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationEvent {
    pub candidate: Candidate,
    pub digest: String,
    pub classification: Classification,
}

#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub matched: u64,
    pub mismatched: u64,
    pub not_found: u64,
    pub snapshot: ThroughputSnapshot,
}

impl VerificationReport {
    pub fn total(&self) -> u64 {
        self.matched + self.mismatched + self.not_found
    }
}

/// 候補語をダイジェスト化して問い合わせ、一致・不一致・未発見に分類する
///
/// 分類イベントは一度だけ読み出せる有限の列。候補語が尽きるか致命的エラーが
/// 起きた時点で接続を閉じ、以後は常に`None`を返す。
pub struct VerificationEngine<L, S, R> {
    lookup: L,
    candidates: S,
    algorithm: HashAlgorithm,
    reporter: R,
    tracker: ThroughputTracker,
    matched: u64,
    mismatched: u64,
    not_found: u64,
    finished: bool,
}

impl<L, S, R> VerificationEngine<L, S, R>
where
    L: LookupClient,
    S: CandidateSource,
    R: ProgressReporter,
{
    pub fn new<C: DehashConfig + ?Sized>(
        lookup: L,
        candidates: S,
        algorithm: HashAlgorithm,
        config: &C,
        reporter: R,
    ) -> Self {
        Self {
            lookup,
            candidates,
            algorithm,
            reporter,
            tracker: ThroughputTracker::new(config.report_interval()),
            matched: 0,
            mismatched: 0,
            not_found: 0,
            finished: false,
        }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 次の候補語を処理して分類結果を返す
    ///
    /// プロトコルエラーは候補語を添えた`DehashError::Fatal`として返る。
    pub async fn next_event(&mut self) -> DehashResult<Option<VerificationEvent>> {
        if self.finished {
            return Ok(None);
        }

        let candidate = match self.candidates.next_candidate().await {
            Ok(Some(candidate)) => candidate,
            Ok(None) => {
                self.finish().await;
                return Ok(None);
            }
            Err(e) => {
                self.finish().await;
                return Err(e);
            }
        };

        let digest = self.algorithm.hex_digest(candidate.as_bytes());
        self.tracker.record_processed();

        let resolution = match self.lookup.resolve(&digest).await {
            Ok(resolution) => resolution,
            Err(e) => {
                self.tracker.record_error();
                error!(
                    candidate = %candidate.display(),
                    digest = %digest,
                    error = %e,
                    severity = e.severity().as_str(),
                    "lookup failed"
                );
                self.finish().await;
                return Err(DehashError::fatal(candidate.display(), e));
            }
        };

        let classification = match resolution {
            Resolution::NotFound => {
                self.not_found += 1;
                Classification::NotFound
            }
            Resolution::Found(returned) if returned == candidate.as_bytes() => {
                self.matched += 1;
                self.tracker.record_resolved();
                Classification::Match
            }
            Resolution::Found(returned) => {
                self.mismatched += 1;
                self.tracker.record_error();
                warn!(
                    candidate = %candidate.display(),
                    digest = %digest,
                    returned = %String::from_utf8_lossy(&returned),
                    "lookup returned a different plaintext"
                );
                Classification::Mismatch { returned }
            }
        };

        Ok(Some(VerificationEvent {
            candidate,
            digest,
            classification,
        }))
    }

    /// 分類イベントのストリームに変換
    pub fn into_stream(self) -> impl Stream<Item = DehashResult<VerificationEvent>> {
        stream::unfold(self, |mut engine| async move {
            match engine.next_event().await {
                Ok(Some(event)) => Some((Ok(event), engine)),
                Ok(None) => None,
                Err(e) => Some((Err(e), engine)),
            }
        })
    }

    /// 全候補語を処理して集計を返す
    pub async fn run(&mut self) -> DehashResult<VerificationReport> {
        let label = format!("{} ({})", self.candidates.source_name(), self.algorithm);
        self.reporter.report_started(&label).await;

        loop {
            match self.next_event().await {
                Ok(Some(_)) => {
                    if let Some(snapshot) = self.tracker.tick(Instant::now()) {
                        self.reporter.report_progress(&snapshot).await;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    match &e {
                        DehashError::Fatal { subject, source } => {
                            self.reporter
                                .report_error(&format!("word {subject}"), source)
                                .await
                        }
                        other => self.reporter.report_error("wordlist", other).await,
                    }
                    return Err(e);
                }
            }
        }

        let report = self.report();
        self.reporter.report_completed(&report.snapshot).await;
        Ok(report)
    }

    pub fn report(&self) -> VerificationReport {
        VerificationReport {
            matched: self.matched,
            mismatched: self.mismatched,
            not_found: self.not_found,
            snapshot: self.tracker.snapshot(),
        }
    }

    async fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.lookup.close().await;
        debug!(
            matched = self.matched,
            mismatched = self.mismatched,
            not_found = self.not_found,
            "verification finished"
        );
    }
}
