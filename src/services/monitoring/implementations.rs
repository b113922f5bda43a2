// 進捗監視の具象実装

use crate::core::{DehashError, ProgressReporter, ThroughputSnapshot};
use async_trait::async_trait;

/// コンソール出力による進捗報告実装
#[derive(Debug, Default, Clone)]
pub struct ConsoleProgressReporter {
    quiet: bool,
}

impl ConsoleProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    fn format_progress(snapshot: &ThroughputSnapshot) -> String {
        format!(
            "processed: {} | found: {} ({:.1}%) | not found: {} | errors: {} | updated: {} | not updated: {} ({:.1}% updated) | {:.0}/s",
            snapshot.processed_total,
            snapshot.resolved_total,
            snapshot.resolved_percent(),
            snapshot.not_found_total(),
            snapshot.error_total,
            snapshot.write_succeeded,
            snapshot.write_failed,
            snapshot.updated_percent(),
            snapshot.rate_per_second,
        )
    }

    /// エラー行と、あれば解決のヒントを整形
    fn format_error(subject: &str, error: &DehashError) -> String {
        let mut message = format!("❌ Error with {subject}: {error}");
        if let Some(suggestion) = error.context().suggestion {
            message.push_str(&format!("\n   💡 {suggestion}"));
        }
        message
    }
}

#[async_trait]
impl ProgressReporter for ConsoleProgressReporter {
    async fn report_started(&self, label: &str) {
        if !self.quiet {
            println!("🚀 Starting {label}...");
        }
    }

    async fn report_progress(&self, snapshot: &ThroughputSnapshot) {
        if !self.quiet {
            println!("📊 {}", Self::format_progress(snapshot));
        }
    }

    async fn report_error(&self, subject: &str, error: &DehashError) {
        // 致命的エラーの通知なのでquietでも表示する
        eprintln!("{}", Self::format_error(subject, error));
    }

    async fn report_completed(&self, snapshot: &ThroughputSnapshot) {
        if !self.quiet {
            println!(
                "✅ Completed in {:.1}s! {}",
                snapshot.elapsed.as_secs_f64(),
                Self::format_progress(snapshot)
            );
        }
    }
}

/// 何もしない進捗報告実装（テスト・ベンチマーク用）
#[derive(Debug, Default, Clone)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for NoOpProgressReporter {
    async fn report_started(&self, _label: &str) {
        // 何もしない
    }

    async fn report_progress(&self, _snapshot: &ThroughputSnapshot) {
        // 何もしない
    }

    async fn report_error(&self, _subject: &str, _error: &DehashError) {
        // 何もしない
    }

    async fn report_completed(&self, _snapshot: &ThroughputSnapshot) {
        // 何もしない
    }
}
