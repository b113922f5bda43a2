// エンジン層 - 逆引き処理のオーケストレーション
// サービス層を組み合わせて一括逆引きと検証を提供

pub mod bulk;
pub mod verification;

// 公開API - 主要エンジンクラス
pub use bulk::{BulkDehashEngine, BulkOutcome, BulkRunReport, BulkState};
pub use verification::{VerificationEngine, VerificationEvent, VerificationReport};
