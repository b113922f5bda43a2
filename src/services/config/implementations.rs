// 設定管理の具象実装

use crate::core::{DehashConfig, DehashError, DehashResult, FetchRetryPolicy};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: usize = 500_000;
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_IDLE_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_DIGEST_FIELD: &str = "hash";
pub const DEFAULT_PLAINTEXT_FIELD: &str = "password";

/// デフォルト設定実装
#[derive(Debug, Clone)]
pub struct DefaultDehashConfig {
    batch_size: usize,
    store_timeout: Duration,
    report_interval: Duration,
    fetch_retry_policy: FetchRetryPolicy,
    lookup_timeout: Option<Duration>,
    idle_delay: Duration,
    stop_when_drained: bool,
    digest_field: String,
    plaintext_field: String,
}

impl DefaultDehashConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn with_fetch_retry_policy(mut self, policy: FetchRetryPolicy) -> Self {
        self.fetch_retry_policy = policy;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn with_idle_delay(mut self, delay: Duration) -> Self {
        self.idle_delay = delay;
        self
    }

    pub fn with_stop_when_drained(mut self, stop: bool) -> Self {
        self.stop_when_drained = stop;
        self
    }

    pub fn with_digest_field(mut self, field: impl Into<String>) -> Self {
        self.digest_field = field.into();
        self
    }

    pub fn with_plaintext_field(mut self, field: impl Into<String>) -> Self {
        self.plaintext_field = field.into();
        self
    }

    /// JSON文字列から設定を読み込む（未指定の項目はデフォルト値）
    pub fn from_json(json: &str) -> DehashResult<Self> {
        let file: ConfigFile = serde_json::from_str(json)
            .map_err(|e| DehashError::configuration(format!("設定ファイル解析エラー: {e}")))?;
        let config = file.apply(Self::default());
        config.validate()?;
        Ok(config)
    }

    /// JSON設定ファイルから読み込む
    pub fn from_file(path: &Path) -> DehashResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| DehashError::input(path, e))?;
        Self::from_json(&json)
    }

    /// 設定の妥当性をチェック
    pub fn validate(&self) -> DehashResult<()> {
        if self.batch_size == 0 {
            return Err(DehashError::validation(
                "batch_size",
                "値は1以上である必要があります",
            ));
        }
        if self.report_interval.is_zero() {
            return Err(DehashError::validation(
                "report_interval",
                "0より大きい値を指定してください",
            ));
        }
        // 0秒だと全ての取得がタイムアウトし、再試行が空回りする
        if self.store_timeout.is_zero() {
            return Err(DehashError::validation(
                "store_timeout",
                "0より大きい値を指定してください",
            ));
        }
        if self.idle_delay.is_zero() {
            return Err(DehashError::validation(
                "idle_delay",
                "0より大きい値を指定してください",
            ));
        }
        if self.digest_field.is_empty() || self.plaintext_field.is_empty() {
            return Err(DehashError::validation(
                "fields",
                "フィールド名は空にできません",
            ));
        }
        // 平文フィールドの有無が未処理判定そのものなので、同じ名前は許可しない
        if self.digest_field == self.plaintext_field {
            return Err(DehashError::validation(
                "plaintext_field",
                "digest_fieldと同じ名前は使えません",
            ));
        }
        Ok(())
    }
}

impl Default for DefaultDehashConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            report_interval: DEFAULT_REPORT_INTERVAL,
            fetch_retry_policy: FetchRetryPolicy::Unbounded,
            lookup_timeout: Some(DEFAULT_LOOKUP_TIMEOUT),
            idle_delay: DEFAULT_IDLE_DELAY,
            stop_when_drained: false,
            digest_field: DEFAULT_DIGEST_FIELD.to_string(),
            plaintext_field: DEFAULT_PLAINTEXT_FIELD.to_string(),
        }
    }
}

impl DehashConfig for DefaultDehashConfig {
    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    fn report_interval(&self) -> Duration {
        self.report_interval
    }

    fn fetch_retry_policy(&self) -> FetchRetryPolicy {
        self.fetch_retry_policy
    }

    fn lookup_timeout(&self) -> Option<Duration> {
        self.lookup_timeout
    }

    fn idle_delay(&self) -> Duration {
        self.idle_delay
    }

    fn stop_when_drained(&self) -> bool {
        self.stop_when_drained
    }

    fn digest_field(&self) -> String {
        self.digest_field.clone()
    }

    fn plaintext_field(&self) -> String {
        self.plaintext_field.clone()
    }
}

/// 設定ファイルの形式
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    batch_size: Option<usize>,
    store_timeout_secs: Option<u64>,
    report_interval_ms: Option<u64>,
    /// 省略時は無制限
    fetch_retry_limit: Option<u32>,
    /// 0でタイムアウト無効
    lookup_timeout_secs: Option<u64>,
    idle_delay_secs: Option<u64>,
    stop_when_drained: Option<bool>,
    digest_field: Option<String>,
    plaintext_field: Option<String>,
}

impl ConfigFile {
    fn apply(self, mut config: DefaultDehashConfig) -> DefaultDehashConfig {
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(secs) = self.store_timeout_secs {
            config.store_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = self.report_interval_ms {
            config.report_interval = Duration::from_millis(ms);
        }
        if let Some(limit) = self.fetch_retry_limit {
            config.fetch_retry_policy = FetchRetryPolicy::Limited(limit);
        }
        if let Some(secs) = self.lookup_timeout_secs {
            config.lookup_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(secs) = self.idle_delay_secs {
            config.idle_delay = Duration::from_secs(secs);
        }
        if let Some(stop) = self.stop_when_drained {
            config.stop_when_drained = stop;
        }
        if let Some(field) = self.digest_field {
            config.digest_field = field;
        }
        if let Some(field) = self.plaintext_field {
            config.plaintext_field = field;
        }
        config
    }
}
