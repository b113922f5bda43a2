// ルックアッププロトコルクライアントの統合テスト
#[path = "../fixtures/mod.rs"]
mod fixtures;

use dehash::core::{ConnectionState, LookupClient, Resolution};
use dehash::services::{LookupEndpoint, TcpLookupClient};
use fixtures::*;
use std::time::Duration;

async fn connect(server: &LookupServer) -> TcpLookupClient {
    let endpoint: LookupEndpoint = server.address().parse().unwrap();
    TcpLookupClient::connect(endpoint, Some(Duration::from_secs(5)))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_present_and_absent_digests() {
    let server = LookupServer::builder()
        .entry(PASSWORD_MD5, "password")
        .spawn()
        .await;
    let mut client = connect(&server).await;

    assert_eq!(
        client.resolve(PASSWORD_MD5).await.unwrap(),
        Resolution::Found(b"password".to_vec())
    );
    assert_eq!(client.resolve("deadbeef").await.unwrap(), Resolution::NotFound);
    assert_eq!(client.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_connection_is_reused() {
    let server = LookupServer::builder()
        .entry(PASSWORD_MD5, "password")
        .spawn()
        .await;
    let mut client = connect(&server).await;

    for _ in 0..10 {
        client.resolve(PASSWORD_MD5).await.unwrap();
    }
    client.close().await;

    // closeの終端行を受け取ってからログを確認する
    tokio::time::sleep(Duration::from_millis(100)).await;
    let log = server.log();
    assert_eq!(log.connections, 1);
    assert_eq!(log.requests.len(), 10);
    assert_eq!(log.terminated_sessions, 1);
}

#[tokio::test]
async fn test_binary_plaintext_is_returned_verbatim() {
    let plaintext = vec![0xe9, b'l', b'a', 0x00, 0xff];
    let server = LookupServer::builder()
        .entry("abc123", plaintext.clone())
        .spawn()
        .await;
    let mut client = connect(&server).await;

    assert_eq!(
        client.resolve("abc123").await.unwrap(),
        Resolution::Found(plaintext)
    );
}

#[tokio::test]
async fn test_reset_faults_client() {
    let server = LookupServer::builder()
        .entry(PASSWORD_MD5, "password")
        .reset_on("deadbeef")
        .spawn()
        .await;
    let mut client = connect(&server).await;

    let err = client.resolve("deadbeef").await.unwrap_err();
    assert!(err.is_protocol());
    assert_eq!(client.state(), ConnectionState::Faulted);

    // Faulted後はソケットに触れずに失敗する
    assert!(client.resolve(PASSWORD_MD5).await.unwrap_err().is_protocol());
    assert_eq!(server.log().requests, vec!["deadbeef".to_string()]);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let server = LookupServer::builder().spawn().await;
    let mut client = connect(&server).await;

    client.close().await;
    client.close().await;

    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(client.resolve(PASSWORD_MD5).await.is_err());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.log().terminated_sessions, 1);
}

#[tokio::test]
async fn test_connect_refused() {
    let endpoint = LookupEndpoint::new("127.0.0.1", 1);
    let result = TcpLookupClient::connect(endpoint, Some(Duration::from_secs(2))).await;

    assert!(matches!(result, Err(ref e) if e.is_protocol()));
}
