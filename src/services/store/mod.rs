// ドキュメントストア
// 未処理レコードの取得と平文の一括書き戻し

pub mod elasticsearch;
pub mod memory;

// 公開API
pub use elasticsearch::ElasticsearchRecordSource;
pub use memory::MemoryRecordSource;
