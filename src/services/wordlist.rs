// ワードリスト読み込み
// 1バイト1文字として行を読み、行末のCR/LFを取り除いて候補語にする

use crate::core::{Candidate, CandidateSource, DehashError, DehashResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// 行末処理：最初の`\r`、無ければ最初の`\n`で切る
pub fn clean_line(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .position(|&b| b == b'\r')
        .or_else(|| line.iter().position(|&b| b == b'\n'))
        .unwrap_or(line.len());
    &line[..end]
}

/// 任意の`AsyncBufRead`から候補語を読み出すリーダー
pub struct WordlistReader<R> {
    reader: R,
    source: PathBuf,
    buffer: Vec<u8>,
    lines_read: u64,
}

impl WordlistReader<BufReader<File>> {
    /// ファイルを開いてリーダーを作成
    pub async fn open(path: &Path) -> DehashResult<Self> {
        let file = File::open(path)
            .await
            .map_err(|e| DehashError::input(path, e))?;
        Ok(Self::with_source(BufReader::new(file), path))
    }
}

impl<R> WordlistReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self::with_source(reader, "<stream>")
    }

    fn with_source(reader: R, source: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            source: source.into(),
            buffer: Vec::new(),
            lines_read: 0,
        }
    }

    /// これまでに読んだ行数
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }
}

#[async_trait]
impl<R> CandidateSource for WordlistReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_candidate(&mut self) -> DehashResult<Option<Candidate>> {
        self.buffer.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buffer)
            .await
            .map_err(|e| DehashError::input(&self.source, e))?;

        if read == 0 {
            return Ok(None);
        }

        self.lines_read += 1;
        Ok(Some(Candidate::new(clean_line(&self.buffer))))
    }

    /// 読み込み元のファイル名部分
    fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// メモリ上の候補語列（テスト・小規模入力用）
#[async_trait]
impl CandidateSource for VecDeque<Candidate> {
    async fn next_candidate(&mut self) -> DehashResult<Option<Candidate>> {
        Ok(self.pop_front())
    }

    fn source_name(&self) -> String {
        "<memory>".to_string()
    }
}
