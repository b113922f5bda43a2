// インプロセスのルックアップサーバー
//
// 1行1ダイジェストで問い合わせを受け、登録済みなら平文、無ければ空行を返す。
// 空行を受け取るとそのセッションを終了する。

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Default, Clone)]
pub struct LookupServerLog {
    pub requests: Vec<String>,
    pub connections: usize,
    pub terminated_sessions: usize,
}

pub struct LookupServer {
    addr: SocketAddr,
    log: Arc<Mutex<LookupServerLog>>,
}

impl LookupServer {
    pub fn builder() -> LookupServerBuilder {
        LookupServerBuilder::default()
    }

    /// `host:port`形式のアドレス
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn log(&self) -> LookupServerLog {
        self.log.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct LookupServerBuilder {
    table: HashMap<String, Vec<u8>>,
    reset_on: HashSet<String>,
}

impl LookupServerBuilder {
    pub fn entry(mut self, digest: &str, plaintext: impl Into<Vec<u8>>) -> Self {
        self.table.insert(digest.to_string(), plaintext.into());
        self
    }

    /// このダイジェストを受け取ったら応答せずに切断する
    pub fn reset_on(mut self, digest: &str) -> Self {
        self.reset_on.insert(digest.to_string());
        self
    }

    pub async fn spawn(self) -> LookupServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let log = Arc::new(Mutex::new(LookupServerLog::default()));

        let table = Arc::new(self.table);
        let reset_on = Arc::new(self.reset_on);
        let server_log = Arc::clone(&log);

        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                server_log.lock().unwrap().connections += 1;
                tokio::spawn(serve_session(
                    socket,
                    Arc::clone(&table),
                    Arc::clone(&reset_on),
                    Arc::clone(&server_log),
                ));
            }
        });

        LookupServer { addr, log }
    }
}

async fn serve_session(
    socket: TcpStream,
    table: Arc<HashMap<String, Vec<u8>>>,
    reset_on: Arc<HashSet<String>>,
    log: Arc<Mutex<LookupServerLog>>,
) {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }

        if line == b"\n" {
            log.lock().unwrap().terminated_sessions += 1;
            return;
        }

        let digest = String::from_utf8_lossy(line.strip_suffix(b"\n").unwrap_or(&line)).into_owned();
        log.lock().unwrap().requests.push(digest.clone());

        if reset_on.contains(&digest) {
            return;
        }

        let mut response = table.get(&digest).cloned().unwrap_or_default();
        response.push(b'\n');
        if write_half.write_all(&response).await.is_err() {
            return;
        }
    }
}
