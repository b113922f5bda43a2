// メモリ内ルックアップテーブル（テスト・オフライン検証用）

use crate::core::{ConnectionState, DehashError, DehashResult, LookupClient, Resolution};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// `LookupClient`のメモリ内実装
///
/// `fault_on`で指定したダイジェストを問い合わせると、TCP実装と同じく
/// プロトコルエラーを返して以後はFaultedになる。
#[derive(Debug, Clone)]
pub struct MemoryLookupTable {
    entries: HashMap<String, Vec<u8>>,
    faulting: HashSet<String>,
    state: ConnectionState,
    calls: usize,
}

impl Default for MemoryLookupTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLookupTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            faulting: HashSet::new(),
            state: ConnectionState::Connected,
            calls: 0,
        }
    }

    /// ダイジェストと平文の組を登録
    pub fn with_entry(mut self, digest: impl Into<String>, plaintext: impl Into<Vec<u8>>) -> Self {
        self.insert(digest, plaintext);
        self
    }

    /// 問い合わせ時に接続障害を起こすダイジェストを登録
    pub fn fault_on(mut self, digest: impl Into<String>) -> Self {
        self.faulting.insert(digest.into());
        self
    }

    pub fn insert(&mut self, digest: impl Into<String>, plaintext: impl Into<Vec<u8>>) {
        self.entries.insert(digest.into(), plaintext.into());
    }

    /// resolveが呼ばれた回数
    pub fn calls(&self) -> usize {
        self.calls
    }
}

#[async_trait]
impl LookupClient for MemoryLookupTable {
    async fn resolve(&mut self, digest: &str) -> DehashResult<Resolution> {
        if self.state != ConnectionState::Connected {
            return Err(DehashError::protocol(format!(
                "ルックアップ接続が利用できません ({:?})",
                self.state
            )));
        }

        self.calls += 1;

        if self.faulting.contains(digest) {
            self.state = ConnectionState::Faulted;
            return Err(DehashError::protocol(format!("{digest}: connection reset")));
        }

        Ok(match self.entries.get(digest) {
            Some(plaintext) if !plaintext.is_empty() => Resolution::Found(plaintext.clone()),
            _ => Resolution::NotFound,
        })
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    async fn close(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}
