// TCPによるルックアッププロトコルクライアント
//
// 要求:  <digest>\n
// 応答:  \n（見つからない） または <plaintext>\n
// 1接続につき同時に1要求のみ。接続は使い回し、再接続はしない。

use super::endpoint::LookupEndpoint;
use crate::core::{ConnectionState, DehashError, DehashResult, LookupClient, Resolution};
use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// 1フレームの最大サイズ（終端の改行を含む）
pub const MAX_FRAME_SIZE: usize = 8192;

/// 永続的な1本のTCP接続を持つルックアップクライアント
pub struct TcpLookupClient {
    endpoint: LookupEndpoint,
    stream: Option<TcpStream>,
    state: ConnectionState,
    io_timeout: Option<Duration>,
    frame: Vec<u8>,
}

impl TcpLookupClient {
    /// 接続を開く（以降すべてのresolveでこの接続を使う）
    pub async fn connect(endpoint: LookupEndpoint, io_timeout: Option<Duration>) -> DehashResult<Self> {
        let stream = with_timeout(
            io_timeout,
            TcpStream::connect((endpoint.host.as_str(), endpoint.port)),
        )
        .await
        .map_err(|e| DehashError::protocol(format!("{endpoint} への接続に失敗しました: {e}")))?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "TCP_NODELAY could not be set");
        }

        info!(%endpoint, "connected to lookup service");

        Ok(Self {
            endpoint,
            stream: Some(stream),
            state: ConnectionState::Connected,
            io_timeout,
            frame: Vec::with_capacity(MAX_FRAME_SIZE),
        })
    }

    pub fn endpoint(&self) -> &LookupEndpoint {
        &self.endpoint
    }

    fn fault(&mut self, reason: &io::Error) {
        warn!(endpoint = %self.endpoint, error = %reason, "lookup connection faulted");
        self.state = ConnectionState::Faulted;
        self.stream = None;
    }
}

#[async_trait]
impl LookupClient for TcpLookupClient {
    async fn resolve(&mut self, digest: &str) -> DehashResult<Resolution> {
        validate_digest(digest)?;

        let stream = match (self.state, self.stream.as_mut()) {
            (ConnectionState::Connected, Some(stream)) => stream,
            (state, _) => {
                return Err(DehashError::protocol(format!(
                    "ルックアップ接続が利用できません ({state:?})"
                )))
            }
        };

        let mut request = Vec::with_capacity(digest.len() + 1);
        request.extend_from_slice(digest.as_bytes());
        request.push(b'\n');

        let exchanged = with_timeout(self.io_timeout, exchange(stream, &request, &mut self.frame)).await;
        match exchanged {
            Ok(()) => Ok(parse_frame(&self.frame)),
            Err(e) => {
                self.fault(&e);
                Err(DehashError::protocol(format!("{digest}: {e}")))
            }
        }
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            // 空行はサーバー側でセッション終了として扱われる
            if let Err(e) = stream.write_all(b"\n").await {
                debug!(error = %e, "failed to send session terminator");
            }
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "failed to shut down lookup connection");
            }
            info!(endpoint = %self.endpoint, "lookup connection closed");
        }
        self.state = ConnectionState::Disconnected;
    }
}

/// 要求フレームとして送れるダイジェストか確認
fn validate_digest(digest: &str) -> DehashResult<()> {
    if digest.is_empty() {
        // 空行はセッション終了の合図になるので送らない
        return Err(DehashError::validation("digest", "空のダイジェストは送信できません"));
    }
    if digest.bytes().any(|b| b == b'\n' || b == b'\r') {
        return Err(DehashError::validation("digest", "改行を含むダイジェストは送信できません"));
    }
    if digest.len() + 1 > MAX_FRAME_SIZE {
        return Err(DehashError::validation("digest", "ダイジェストがフレーム上限を超えています"));
    }
    Ok(())
}

/// 終端を含む1フレームを結果に変換
pub(crate) fn parse_frame(frame: &[u8]) -> Resolution {
    let body = frame.strip_suffix(b"\n").unwrap_or(frame);
    if body.is_empty() {
        Resolution::NotFound
    } else {
        Resolution::Found(body.to_vec())
    }
}

/// 要求を書き込み、改行で終わる応答を1つだけ読む
async fn exchange(stream: &mut TcpStream, request: &[u8], frame: &mut Vec<u8>) -> io::Result<()> {
    stream.write_all(request).await?;

    frame.clear();
    let mut chunk = [0u8; MAX_FRAME_SIZE];
    loop {
        let room = MAX_FRAME_SIZE - frame.len();
        let read = stream.read(&mut chunk[..room]).await?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "lookup service closed the connection",
            ));
        }
        frame.extend_from_slice(&chunk[..read]);

        if let Some(end) = frame.iter().position(|&b| b == b'\n') {
            if end + 1 != frame.len() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "unexpected bytes after response terminator",
                ));
            }
            return Ok(());
        }
        if frame.len() >= MAX_FRAME_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("response exceeds {MAX_FRAME_SIZE} bytes"),
            ));
        }
    }
}

async fn with_timeout<F, T>(limit: Option<Duration>, future: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "lookup I/O timed out"))?,
        None => future.await,
    }
}
