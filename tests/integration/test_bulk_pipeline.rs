// 一括モードの統合テスト（ストア取得 → TCPルックアップ → 書き戻し）
#[path = "../fixtures/mod.rs"]
mod fixtures;

use dehash::core::{Record, RecordSource, WriteBackStats};
use dehash::engine::{BulkDehashEngine, BulkOutcome};
use dehash::services::{
    DefaultDehashConfig, ElasticsearchRecordSource, NoOpProgressReporter, TcpLookupClient,
};
use fixtures::*;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const LETMEIN_MD5: &str = "0d107d09f5bbe40cade3de5c71e9e9b7";

fn config() -> DefaultDehashConfig {
    DefaultDehashConfig::default()
        .with_stop_when_drained(true)
        .with_store_timeout(Duration::from_secs(5))
}

async fn lookup(server: &LookupServer) -> TcpLookupClient {
    TcpLookupClient::connect(server.address().parse().unwrap(), Some(Duration::from_secs(5)))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_store_contract() {
    let store = FakeStore::spawn(&[("1", PASSWORD_MD5), ("2", LETMEIN_MD5)]).await;
    let source = ElasticsearchRecordSource::new(&store.url(), "leaks", &config()).unwrap();

    let batch = source.fetch_unresolved_batch(10).await.unwrap();
    assert_eq!(batch, vec![Record::new("1", PASSWORD_MD5), Record::new("2", LETMEIN_MD5)]);
    assert!(store.search_paths()[0].starts_with("/leaks/_search?filter_path="));

    let stats = source
        .write_back_batch(&[
            Record::new("1", PASSWORD_MD5).with_plaintext("password"),
            Record::new("missing", "ff").with_plaintext("x"),
        ])
        .await
        .unwrap();
    assert_eq!(stats, WriteBackStats::new(1, 1));
    assert_eq!(store.plaintext_of("1").as_deref(), Some("password"));

    // 平文を持つレコードは以後の取得に現れない
    let batch = source.fetch_unresolved_batch(10).await.unwrap();
    assert_eq!(batch, vec![Record::new("2", LETMEIN_MD5)]);
}

#[tokio::test]
async fn test_empty_write_back_sends_nothing() {
    let store = FakeStore::spawn(&[]).await;
    let source = ElasticsearchRecordSource::new(&store.url(), "leaks", &config()).unwrap();

    assert_eq!(source.write_back_batch(&[]).await.unwrap(), WriteBackStats::new(0, 0));
    assert_eq!(store.bulk_requests(), 0);
    assert!(source.fetch_unresolved_batch(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bulk_run_resolves_and_writes_back() {
    let store = FakeStore::spawn(&[("1", PASSWORD_MD5), ("2", "deadbeef"), ("3", LETMEIN_MD5)]).await;
    let server = LookupServer::builder()
        .entry(PASSWORD_MD5, "password")
        .entry(LETMEIN_MD5, "letmein")
        .spawn()
        .await;

    let source = ElasticsearchRecordSource::new(&store.url(), "leaks", &config()).unwrap();
    let mut engine = BulkDehashEngine::new(
        lookup(&server).await,
        source,
        config(),
        NoOpProgressReporter::new(),
        CancellationToken::new(),
    );
    let report = engine.run().await;

    assert_eq!(report.outcome, BulkOutcome::Drained);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.snapshot.resolved_total, 2);
    assert_eq!(report.snapshot.write_succeeded, 2);
    assert_eq!(store.plaintext_of("1").as_deref(), Some("password"));
    assert_eq!(store.plaintext_of("2"), None);
    assert_eq!(store.plaintext_of("3").as_deref(), Some("letmein"));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.log().terminated_sessions, 1);
}

#[tokio::test]
async fn test_small_batches() {
    let store = FakeStore::spawn(&[("1", PASSWORD_MD5), ("2", LETMEIN_MD5)]).await;
    let server = LookupServer::builder()
        .entry(PASSWORD_MD5, "password")
        .entry(LETMEIN_MD5, "letmein")
        .spawn()
        .await;

    let source = ElasticsearchRecordSource::new(&store.url(), "leaks", &config()).unwrap();
    let mut engine = BulkDehashEngine::new(
        lookup(&server).await,
        source,
        config().with_batch_size(1),
        NoOpProgressReporter::new(),
        CancellationToken::new(),
    );
    let report = engine.run().await;

    assert_eq!(report.batches, 2);
    assert_eq!(store.bulk_requests(), 2);
    assert_eq!(report.snapshot.processed_total, 2);
}

#[tokio::test]
async fn test_lookup_failure_keeps_resolved_records() {
    let store = FakeStore::spawn(&[("1", PASSWORD_MD5), ("2", "deadbeef"), ("3", LETMEIN_MD5)]).await;
    let server = LookupServer::builder()
        .entry(PASSWORD_MD5, "password")
        .entry(LETMEIN_MD5, "letmein")
        .reset_on("deadbeef")
        .spawn()
        .await;

    let source = ElasticsearchRecordSource::new(&store.url(), "leaks", &config()).unwrap();
    let mut engine = BulkDehashEngine::new(
        lookup(&server).await,
        source,
        config(),
        NoOpProgressReporter::new(),
        CancellationToken::new(),
    );
    let report = engine.run().await;

    match &report.outcome {
        BulkOutcome::Failed { subject, .. } => assert_eq!(subject, "deadbeef"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(report.exit_code(), 1);
    assert_eq!(store.plaintext_of("1").as_deref(), Some("password"));
    assert_eq!(store.plaintext_of("3"), None);
}

#[tokio::test]
async fn test_unreachable_store_fails_run() {
    let server = LookupServer::builder().spawn().await;
    // 何も待ち受けていないポート
    let source = ElasticsearchRecordSource::new("http://127.0.0.1:1", "leaks", &config()).unwrap();

    let mut engine = BulkDehashEngine::new(
        lookup(&server).await,
        source,
        config(),
        NoOpProgressReporter::new(),
        CancellationToken::new(),
    );
    let report = engine.run().await;

    assert!(matches!(report.outcome, BulkOutcome::Failed { .. }));
    assert_eq!(report.snapshot.processed_total, 0);
}
