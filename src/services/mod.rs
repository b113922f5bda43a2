// サービス層 - 機能別のビジネスロジック
// 各サービスは特定の責任を持ち、疎結合で設計されている

pub mod config;
pub mod digest;
pub mod lookup;
pub mod monitoring;
pub mod store;
pub mod wordlist;

// 公開API - 各サービスの主要機能を明示的にエクスポート
pub use config::DefaultDehashConfig;
pub use digest::HashAlgorithm;
pub use lookup::{LookupEndpoint, MemoryLookupTable, TcpLookupClient};
pub use monitoring::{ConsoleProgressReporter, NoOpProgressReporter, ThroughputTracker};
pub use store::{ElasticsearchRecordSource, MemoryRecordSource};
pub use wordlist::WordlistReader;
