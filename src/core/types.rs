// 逆引き処理に関連するデータ型定義

use super::error::{DehashError, DehashResult};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// ドキュメントストアから取得した1件分の作業単位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// ストア側のドキュメントID
    pub id: String,
    /// ルックアップキーとなるダイジェスト
    pub digest: String,
    /// 逆引きに成功した平文（成功時のみ設定）
    pub plaintext: Option<String>,
}

impl Record {
    pub fn new(id: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            digest: digest.into(),
            plaintext: None,
        }
    }

    pub fn with_plaintext(mut self, plaintext: impl Into<String>) -> Self {
        self.plaintext = Some(plaintext.into());
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.plaintext.is_some()
    }
}

/// 1回のresolve呼び出しの結果
///
/// プロトコルエラーは`Err(DehashError::Protocol)`として別経路で返る。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// 平文が見つかった（終端文字を除いた生バイト列、空でない）
    Found(Vec<u8>),
    /// テーブルに存在しない
    NotFound,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// UTF-8の平文として取り出す
    ///
    /// UTF-8として解釈できない場合は`Encoding`エラー。
    pub fn into_text(self) -> DehashResult<Option<String>> {
        match self {
            Self::NotFound => Ok(None),
            Self::Found(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| DehashError::encoding(e.to_string())),
        }
    }
}

/// 検証モードでの候補語
///
/// 1バイト1文字（Latin-1）でデコードされた行をバイト列のまま保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    bytes: Vec<u8>,
}

impl Candidate {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Latin-1として表示用文字列に変換
    pub fn display(&self) -> String {
        self.bytes.iter().map(|&b| b as char).collect()
    }
}

/// 検証モードの分類結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// テーブルに存在しない
    NotFound,
    /// 返された平文が候補語と一致
    Match,
    /// 返された平文が候補語と異なる
    Mismatch { returned: Vec<u8> },
}

/// ルックアップ接続の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Faulted,
}

/// 取得時タイムアウトの再試行方針
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchRetryPolicy {
    /// タイムアウトの間は無制限に同じ取得を繰り返す
    #[default]
    Unbounded,
    /// 指定回数まで再試行し、超えたらエラーとして返す
    Limited(u32),
}

impl FetchRetryPolicy {
    /// `retries`回再試行済みの状態で、さらに再試行してよいか
    pub fn allows_retry(&self, retries: u32) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Limited(max) => retries < *max,
        }
    }
}

/// 一括書き戻しの結果（件数のみ）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteBackStats {
    pub succeeded: usize,
    pub failed: usize,
}

impl WriteBackStats {
    pub fn new(succeeded: usize, failed: usize) -> Self {
        Self { succeeded, failed }
    }

    /// 呼び出し全体が失敗した場合は提出件数をすべて失敗として扱う
    pub fn all_failed(submitted: usize) -> Self {
        Self {
            succeeded: 0,
            failed: submitted,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// 進捗報告用のスナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct ThroughputSnapshot {
    pub processed_total: u64,
    pub resolved_total: u64,
    pub error_total: u64,
    pub write_succeeded: u64,
    pub write_failed: u64,
    /// 直近の報告間隔での処理速度（件/秒）
    pub rate_per_second: f64,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl ThroughputSnapshot {
    /// 見つからなかった件数
    pub fn not_found_total(&self) -> u64 {
        self.processed_total
            .saturating_sub(self.resolved_total)
            .saturating_sub(self.error_total)
    }

    pub fn resolved_percent(&self) -> f64 {
        percent(self.resolved_total, self.processed_total)
    }

    pub fn updated_percent(&self) -> f64 {
        percent(self.write_succeeded, self.write_succeeded + self.write_failed)
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
