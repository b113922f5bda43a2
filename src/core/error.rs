// Custom error types for the dehash pipeline
// 逆引きパイプライン専用のカスタムエラー型定義

use std::path::PathBuf;
use thiserror::Error;

/// 逆引き処理固有のエラー型
#[derive(Error, Debug)]
pub enum DehashError {
    #[error("プロトコルエラー: {message}")]
    Protocol { message: String },

    #[error("ストアタイムアウト: {message}")]
    StoreTimeout { message: String },

    #[error("ストアエラー: {message}")]
    Store { message: String },

    #[error("ストア書き戻しエラー: {message}")]
    StoreWrite { message: String },

    #[error("文字コードエラー: {message}")]
    Encoding { message: String },

    #[error("入力エラー: {} - {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("設定エラー: {message}")]
    Configuration { message: String },

    #[error("バリデーションエラー: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("致命的エラー ({subject}): {source}")]
    Fatal {
        subject: String,
        #[source]
        source: Box<DehashError>,
    },
}

impl DehashError {
    /// プロトコルエラーの作成
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// ストアタイムアウトの作成
    pub fn store_timeout(message: impl Into<String>) -> Self {
        Self::StoreTimeout {
            message: message.into(),
        }
    }

    /// ストアエラーの作成
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// 書き戻しエラーの作成
    pub fn store_write(message: impl Into<String>) -> Self {
        Self::StoreWrite {
            message: message.into(),
        }
    }

    /// 文字コードエラーの作成
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// 入力エラーの作成
    pub fn input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Input {
            path: path.into(),
            source,
        }
    }

    /// 設定エラーの作成
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// バリデーションエラーの作成
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// 対象（ダイジェストや候補語）を付けて致命的エラーに包む
    pub fn fatal(subject: impl Into<String>, source: DehashError) -> Self {
        Self::Fatal {
            subject: subject.into(),
            source: Box::new(source),
        }
    }

    /// プロトコル起因のエラーかどうか（Fatalの中身も見る）
    pub fn is_protocol(&self) -> bool {
        match self {
            Self::Protocol { .. } => true,
            Self::Fatal { source, .. } => source.is_protocol(),
            _ => false,
        }
    }

    /// エラーの重要度を取得
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Encoding { .. } => ErrorSeverity::Low,
            Self::StoreTimeout { .. } | Self::StoreWrite { .. } => ErrorSeverity::Medium,
            Self::Store { .. } | Self::Input { .. } => ErrorSeverity::High,
            Self::Configuration { .. } | Self::Validation { .. } => ErrorSeverity::High,
            Self::Protocol { .. } | Self::Fatal { .. } => ErrorSeverity::Critical,
        }
    }

    /// エラーが回復可能かどうかを判定
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::StoreTimeout { .. } | Self::StoreWrite { .. } | Self::Encoding { .. } => true,
            Self::Protocol { .. } | Self::Fatal { .. } => false,
            Self::Store { .. } | Self::Input { .. } => false,
            Self::Configuration { .. } | Self::Validation { .. } => false,
        }
    }

    /// エラーコンテキストを取得
    pub fn context(&self) -> ErrorContext {
        match self {
            Self::Protocol { .. } => ErrorContext::new("lookup")
                .with_suggestion("ルックアップサービスが起動しているか確認してください"),
            Self::StoreTimeout { .. } | Self::Store { .. } => ErrorContext::new("store_fetch")
                .with_suggestion("ドキュメントストアのURLと稼働状況を確認してください"),
            Self::StoreWrite { .. } => ErrorContext::new("store_write_back"),
            Self::Input { path, .. } => ErrorContext::new("read_input")
                .with_resource(path.display().to_string())
                .with_suggestion("ファイルパスとアクセス権限を確認してください"),
            Self::Configuration { message } => ErrorContext::new("configuration")
                .with_suggestion(format!("設定を確認してください: {message}")),
            Self::Validation { field, .. } => ErrorContext::new("validation").with_resource(field),
            Self::Fatal { subject, source } => {
                let mut context = source.context().with_resource(subject);
                context.operation = format!("fatal:{}", context.operation);
                context
            }
            Self::Encoding { .. } => ErrorContext::new("decode_plaintext"),
        }
    }
}

/// エラーの重要度レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 低重要度 - ログ出力程度
    Low,
    /// 中重要度 - 警告レベル
    Medium,
    /// 高重要度 - 要対応
    High,
    /// 致命的 - 実行停止レベル
    Critical,
}

impl ErrorSeverity {
    /// 重要度の文字列表現を取得
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// エラーコンテキスト情報
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// 実行していた操作
    pub operation: String,
    /// 関連するリソース（ダイジェスト、候補語、ファイルパス等）
    pub resource: Option<String>,
    /// エラー解決のための提案
    pub suggestion: Option<String>,
}

impl ErrorContext {
    /// 新しいエラーコンテキストを作成
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            resource: None,
            suggestion: None,
        }
    }

    /// リソース情報を追加
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// 提案を追加
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// 逆引き処理の結果型
pub type DehashResult<T> = std::result::Result<T, DehashError>;
