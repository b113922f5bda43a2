// ルックアップサービス接続
// 行指向プロトコルのTCPクライアントとメモリ内実装

pub mod endpoint;
pub mod memory;
pub mod tcp;

// 公開API
pub use endpoint::LookupEndpoint;
pub use memory::MemoryLookupTable;
pub use tcp::{TcpLookupClient, MAX_FRAME_SIZE};
