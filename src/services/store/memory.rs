// メモリ内ドキュメントストア（テスト・ドライラン用）

use crate::core::{DehashError, DehashResult, Record, RecordSource, WriteBackStats};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct StoredDocument {
    digest: String,
    plaintext: Option<String>,
}

#[derive(Debug, Default)]
struct StoreState {
    documents: BTreeMap<String, StoredDocument>,
    pending_timeouts: u32,
    failing_ids: HashSet<String>,
    fetch_calls: usize,
    write_calls: usize,
    closed: bool,
}

/// `RecordSource`のメモリ内実装
///
/// クローンは同じ状態を共有するので、エンジンに渡した後もテスト側から
/// 書き戻し結果を確認できる。
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 未処理ドキュメントを追加
    pub fn with_document(self, id: impl Into<String>, digest: impl Into<String>) -> Self {
        self.lock().documents.insert(
            id.into(),
            StoredDocument {
                digest: digest.into(),
                plaintext: None,
            },
        );
        self
    }

    /// 処理済み（平文あり）のドキュメントを追加
    pub fn with_resolved_document(
        self,
        id: impl Into<String>,
        digest: impl Into<String>,
        plaintext: impl Into<String>,
    ) -> Self {
        self.lock().documents.insert(
            id.into(),
            StoredDocument {
                digest: digest.into(),
                plaintext: Some(plaintext.into()),
            },
        );
        self
    }

    /// 次のn回の取得をタイムアウトさせる
    pub fn with_fetch_timeouts(self, count: u32) -> Self {
        self.lock().pending_timeouts = count;
        self
    }

    /// 書き戻しを常に失敗させるドキュメントID
    pub fn with_failing_write(self, id: impl Into<String>) -> Self {
        self.lock().failing_ids.insert(id.into());
        self
    }

    pub fn plaintext_of(&self, id: &str) -> Option<String> {
        self.lock()
            .documents
            .get(id)
            .and_then(|doc| doc.plaintext.clone())
    }

    pub fn unresolved_count(&self) -> usize {
        self.lock()
            .documents
            .values()
            .filter(|doc| doc.plaintext.is_none())
            .count()
    }

    pub fn fetch_calls(&self) -> usize {
        self.lock().fetch_calls
    }

    pub fn write_calls(&self) -> usize {
        self.lock().write_calls
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    async fn fetch_unresolved_batch(&self, limit: usize) -> DehashResult<Vec<Record>> {
        let mut state = self.lock();
        state.fetch_calls += 1;

        if state.pending_timeouts > 0 {
            state.pending_timeouts -= 1;
            return Err(DehashError::store_timeout("memory store: simulated timeout"));
        }

        Ok(state
            .documents
            .iter()
            .filter(|(_, doc)| doc.plaintext.is_none())
            .take(limit)
            .map(|(id, doc)| Record::new(id.clone(), doc.digest.clone()))
            .collect())
    }

    async fn write_back_batch(&self, records: &[Record]) -> DehashResult<WriteBackStats> {
        let resolved: Vec<&Record> = records.iter().filter(|r| r.is_resolved()).collect();
        if resolved.is_empty() {
            return Ok(WriteBackStats::default());
        }

        let mut state = self.lock();
        state.write_calls += 1;

        let mut stats = WriteBackStats::default();
        for record in resolved {
            if state.failing_ids.contains(&record.id) {
                stats.failed += 1;
                continue;
            }
            match state.documents.get_mut(&record.id) {
                Some(doc) => {
                    doc.plaintext = record.plaintext.clone();
                    stats.succeeded += 1;
                }
                None => stats.failed += 1,
            }
        }
        Ok(stats)
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}
