// ハッシュ逆引きクライアント
//
// ルックアップサービスへの行指向TCPプロトコルでダイジェストを平文に戻す。
// 検証モード（ワードリスト照合）と一括モード（ドキュメントストアの書き戻し）を提供する。

pub mod cli;
pub mod core;
pub mod engine;
pub mod services;
