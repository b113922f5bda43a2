// 逆引きシステムのトレイト定義
// 全ての抽象化インターフェースを定義

use super::error::{DehashError, DehashResult};
use super::types::{
    Candidate, ConnectionState, FetchRetryPolicy, Record, Resolution, ThroughputSnapshot, WriteBackStats,
};
use async_trait::async_trait;
use mockall::automock;
use std::time::Duration;

/// ルックアップサービスへの接続を抽象化するトレイト
///
/// 1つの接続に同時に投げられる要求は1件だけなので、`resolve`は`&mut self`を取る。
/// 並列化する場合はワーカーごとに別の接続を持たせること。
#[automock]
#[async_trait]
pub trait LookupClient: Send + Sync {
    /// ダイジェストに対応する平文を問い合わせる
    async fn resolve(&mut self, digest: &str) -> DehashResult<Resolution>;

    /// 現在の接続状態
    fn state(&self) -> ConnectionState;

    /// 接続を閉じる（2回目以降は何もしない）
    async fn close(&mut self);
}

/// ドキュメントストアを抽象化するトレイト
#[automock]
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// 平文フィールドを持たないレコードを最大`limit`件取得
    async fn fetch_unresolved_batch(&self, limit: usize) -> DehashResult<Vec<Record>>;

    /// 平文が設定されたレコードを一括で書き戻す
    ///
    /// 空のスライスは常に`(0, 0)`を返す。
    async fn write_back_batch(&self, records: &[Record]) -> DehashResult<WriteBackStats>;

    /// ストア接続の解放
    async fn close(&self);
}

/// 検証モードの候補語の供給元
#[automock]
#[async_trait]
pub trait CandidateSource: Send {
    /// 次の候補語（終端に達したらNone）
    async fn next_candidate(&mut self) -> DehashResult<Option<Candidate>>;

    /// 進捗表示に使う供給元の名前
    fn source_name(&self) -> String;
}

/// 進捗報告の抽象化トレイト
#[automock]
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// 処理開始時の報告
    async fn report_started(&self, label: &str);

    /// 進捗更新の報告（報告間隔ごと）
    async fn report_progress(&self, snapshot: &ThroughputSnapshot);

    /// 致命的エラーの報告（`subject`は「word password」のように対象の種類を含む）
    async fn report_error(&self, subject: &str, error: &DehashError);

    /// 処理完了時の報告
    async fn report_completed(&self, snapshot: &ThroughputSnapshot);
}

/// 逆引き処理の設定を抽象化するトレイト
#[automock]
pub trait DehashConfig: Send + Sync {
    /// 1回の取得で扱う最大レコード数
    fn batch_size(&self) -> usize;

    /// ストア操作のタイムアウト
    fn store_timeout(&self) -> Duration;

    /// 進捗報告の最小間隔
    fn report_interval(&self) -> Duration;

    /// 取得タイムアウト時の再試行方針
    fn fetch_retry_policy(&self) -> FetchRetryPolicy;

    /// ルックアップ1回あたりのI/Oタイムアウト（Noneなら無期限）
    fn lookup_timeout(&self) -> Option<Duration>;

    /// 未処理レコードが無いときの待機時間
    fn idle_delay(&self) -> Duration;

    /// 未処理レコードが尽きたら終了するかどうか
    fn stop_when_drained(&self) -> bool;

    /// ダイジェストを格納するフィールド名
    fn digest_field(&self) -> String;

    /// 平文を書き戻すフィールド名
    fn plaintext_field(&self) -> String;
}
