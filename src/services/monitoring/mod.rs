// 進捗監視機能
// スループット計測と進捗・エラー・完了の報告

pub mod implementations;
pub mod tracker;

// 公開API
pub use implementations::{ConsoleProgressReporter, NoOpProgressReporter};
pub use tracker::ThroughputTracker;
