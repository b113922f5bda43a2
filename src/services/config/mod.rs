// 設定管理
// デフォルト値、ビルダー、JSON設定ファイル

pub mod implementations;

// 公開API
pub use implementations::DefaultDehashConfig;
