// Elasticsearchをドキュメントストアとして使うRecordSource
//
// 取得: 平文フィールドが存在しないドキュメントを検索
// 書き戻し: _bulk APIによる部分更新

use crate::core::{DehashConfig, DehashError, DehashResult, Record, RecordSource, WriteBackStats};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const SEARCH_FILTER_PATH: &str = "hits.hits._id,hits.hits._source";

pub struct ElasticsearchRecordSource {
    http: Client,
    base_url: String,
    index: String,
    digest_field: String,
    plaintext_field: String,
    timeout: Duration,
}

impl ElasticsearchRecordSource {
    pub fn new<C: DehashConfig + ?Sized>(
        base_url: &str,
        index: impl Into<String>,
        config: &C,
    ) -> DehashResult<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| DehashError::validation("store_url", format!("{base_url}: {e}")))?;
        let index = index.into();
        if index.is_empty() {
            return Err(DehashError::validation("collection", "インデックス名が空です"));
        }

        let http = Client::builder()
            .timeout(config.store_timeout())
            .build()
            .map_err(|e| DehashError::configuration(format!("HTTPクライアント作成エラー: {e}")))?;

        Ok(Self {
            http,
            base_url: url.as_str().trim_end_matches('/').to_string(),
            index,
            digest_field: config.digest_field(),
            plaintext_field: config.plaintext_field(),
            timeout: config.store_timeout(),
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// 未処理レコード検索のリクエストボディ
    ///
    /// 条件は「平文フィールドが存在しない」のみ。書き戻しに失敗したレコードも
    /// 次回以降の検索で再び対象になる。
    pub fn search_body(&self, limit: usize) -> Value {
        json!({
            "size": limit,
            "_source": [self.digest_field],
            "query": {
                "bool": {
                    "must_not": {
                        "exists": { "field": self.plaintext_field }
                    }
                }
            }
        })
    }

    /// _bulk用のNDJSONボディ（平文が設定されたレコードのみ）
    pub fn bulk_body(&self, records: &[Record]) -> String {
        let mut body = String::new();
        for record in records {
            let Some(plaintext) = &record.plaintext else {
                continue;
            };
            let action = json!({ "update": { "_index": self.index, "_id": record.id } });
            let mut doc = serde_json::Map::new();
            doc.insert(self.plaintext_field.clone(), Value::String(plaintext.clone()));
            let update = json!({ "doc": doc });

            body.push_str(&action.to_string());
            body.push('\n');
            body.push_str(&update.to_string());
            body.push('\n');
        }
        body
    }

    fn fetch_error(&self, error: reqwest::Error) -> DehashError {
        if error.is_timeout() {
            DehashError::store_timeout(format!("{}秒以内に応答がありません: {error}", self.timeout.as_secs()))
        } else {
            DehashError::store(error.to_string())
        }
    }
}

#[async_trait]
impl RecordSource for ElasticsearchRecordSource {
    async fn fetch_unresolved_batch(&self, limit: usize) -> DehashResult<Vec<Record>> {
        let url = format!("{}/{}/_search", self.base_url, self.index);
        let response = self
            .http
            .post(&url)
            .query(&[("filter_path", SEARCH_FILTER_PATH)])
            .json(&self.search_body(limit))
            .send()
            .await
            .map_err(|e| self.fetch_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                    DehashError::store_timeout(format!("{status}: {message}"))
                }
                _ => DehashError::store(format!("{status}: {message}")),
            });
        }

        let body: SearchResponse = response.json().await.map_err(|e| self.fetch_error(e))?;
        let records = parse_search_response(body, &self.digest_field);
        debug!(count = records.len(), index = %self.index, "fetched unresolved records");
        Ok(records)
    }

    async fn write_back_batch(&self, records: &[Record]) -> DehashResult<WriteBackStats> {
        let body = self.bulk_body(records);
        if body.is_empty() {
            return Ok(WriteBackStats::default());
        }

        let url = format!("{}/_bulk", self.base_url);
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| DehashError::store_write(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DehashError::store_write(format!("{status}: {message}")));
        }

        let body: BulkResponse = response
            .json()
            .await
            .map_err(|e| DehashError::store_write(e.to_string()))?;
        Ok(count_bulk_items(&body))
    }

    async fn close(&self) {
        info!(index = %self.index, "store client released");
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    // filter_pathを使うとヒット0件のときhitsごと省略される
    #[serde(default)]
    hits: Option<SearchHits>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

fn parse_search_response(response: SearchResponse, digest_field: &str) -> Vec<Record> {
    let hits = response.hits.map(|h| h.hits).unwrap_or_default();
    let mut records = Vec::with_capacity(hits.len());
    for hit in hits {
        match hit.source.get(digest_field).and_then(Value::as_str) {
            Some(digest) => records.push(Record::new(hit.id, digest)),
            None => warn!(id = %hit.id, field = digest_field, "document has no digest field, skipped"),
        }
    }
    records
}

fn count_bulk_items(response: &BulkResponse) -> WriteBackStats {
    let mut stats = WriteBackStats::default();
    for item in response.items.iter().flat_map(|entry| entry.values()) {
        if (200..300).contains(&item.status) && item.error.is_none() {
            stats.succeeded += 1;
        } else {
            stats.failed += 1;
        }
    }
    stats
}
