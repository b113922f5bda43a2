// main.rsとエントリーポイントのテスト
#[path = "../fixtures/mod.rs"]
mod fixtures;

use fixtures::*;
use std::io::Write;
use std::process::Output;
use tempfile::NamedTempFile;
use tokio::process::Command;

const LETMEIN_MD5: &str = "0d107d09f5bbe40cade3de5c71e9e9b7";

async fn dehash(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dehash"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .await
        .expect("Failed to execute binary")
}

#[tokio::test]
async fn test_cli_help() {
    let output = dehash(&["--help"]).await;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("dehash"));
    assert!(stdout.contains("verify"));
    assert!(stdout.contains("bulk"));
}

#[tokio::test]
async fn test_cli_version() {
    let output = dehash(&["--version"]).await;

    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().contains("dehash"));
}

#[tokio::test]
async fn test_verify_missing_wordlist() {
    let output = dehash(&["verify", "/nonexistent/words.txt", "md5", "127.0.0.1:4242"]).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Wordlist file does not exist"));
}

#[tokio::test]
async fn test_verify_unknown_algorithm() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "password").unwrap();

    let output = dehash(&[
        "verify",
        file.path().to_str().unwrap(),
        "whirlpool",
        "127.0.0.1:4242",
    ])
    .await;

    assert_eq!(output.status.code(), Some(1));
}

#[tokio::test]
async fn test_verify_end_to_end() {
    let server = LookupServer::builder()
        .entry(PASSWORD_MD5, "password")
        .spawn()
        .await;
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "password\r\nnope\n").unwrap();

    let output = dehash(&["verify", file.path().to_str().unwrap(), "md5", server.address().as_str()]).await;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("一致: 1"));
    assert!(stdout.contains("未登録: 1"));
}

#[tokio::test]
async fn test_verify_connection_loss_exits_with_word() {
    let server = LookupServer::builder().reset_on(PASSWORD_MD5).spawn().await;
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "password").unwrap();

    let output = dehash(&[
        "--quiet",
        "verify",
        file.path().to_str().unwrap(),
        "md5",
        server.address().as_str(),
    ])
    .await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Error with word password").count(), 1);
}

#[tokio::test]
async fn test_bulk_end_to_end() {
    let store = FakeStore::spawn(&[("1", PASSWORD_MD5), ("2", LETMEIN_MD5), ("3", "deadbeef")]).await;
    let server = LookupServer::builder()
        .entry(PASSWORD_MD5, "password")
        .entry(LETMEIN_MD5, "letmein")
        .spawn()
        .await;

    let output = dehash(&[
        "bulk",
        store.url().as_str(),
        "leaks",
        server.address().as_str(),
        "--stop-when-drained",
    ])
    .await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(store.plaintext_of("1").as_deref(), Some("password"));
    assert_eq!(store.plaintext_of("2").as_deref(), Some("letmein"));
    assert_eq!(store.plaintext_of("3"), None);
}

#[tokio::test]
async fn test_bulk_unreachable_store_names_fetch() {
    let server = LookupServer::builder().spawn().await;

    // 何も待ち受けていないポート
    let output = dehash(&[
        "--quiet",
        "bulk",
        "http://127.0.0.1:1",
        "leaks",
        server.address().as_str(),
    ])
    .await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Error with store fetch").count(), 1);
    assert!(!stderr.contains("Error with hash"));
}

#[tokio::test]
async fn test_bulk_invalid_lookup_address() {
    let output = dehash(&["bulk", "http://127.0.0.1:9200", "leaks", "no-port"]).await;

    assert_eq!(output.status.code(), Some(1));
}
