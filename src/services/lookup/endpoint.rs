// ルックアップサービスの接続先（host:port）

use crate::core::{DehashError, DehashResult};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupEndpoint {
    pub host: String,
    pub port: u16,
}

impl LookupEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl FromStr for LookupEndpoint {
    type Err = DehashError;

    fn from_str(s: &str) -> DehashResult<Self> {
        let (host, port) = s.rsplit_once(':').ok_or_else(|| {
            DehashError::validation("lookup", format!("host:port形式で指定してください: {s}"))
        })?;

        // [::1]:9000 のようなIPv6表記
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(DehashError::validation("lookup", "ホスト名が空です"));
        }

        let port: u16 = port
            .parse()
            .map_err(|_| DehashError::validation("lookup", format!("不正なポート番号: {port}")))?;
        if port == 0 {
            return Err(DehashError::validation("lookup", "ポート番号0は使えません"));
        }

        Ok(Self::new(host, port))
    }
}

impl fmt::Display for LookupEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
