// 統合テスト用のフィクスチャ
// ルックアップサービスとドキュメントストアのインプロセス実装
#![allow(dead_code)]

pub mod lookup_server;

// 公開API
pub use lookup_server::*;
pub use store_server::*;

pub const PASSWORD_MD5: &str = "5f4dcc3b5aa765d61d8327deb882cf99";
pub const PASSWORD_SHA1: &str = "5baa61e4c9b93f3f0682250b6cf8331b7ee68fd8";
