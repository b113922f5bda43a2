pub mod bulk;
pub mod verify;

pub use bulk::*;
pub use verify::*;

use crate::services::{ConsoleProgressReporter, DefaultDehashConfig};
use anyhow::{Context, Result};
use std::path::Path;

/// 設定ファイル（任意）を読み込む。指定が無ければデフォルト値
pub fn load_config(path: Option<&Path>) -> Result<DefaultDehashConfig> {
    match path {
        Some(path) => DefaultDehashConfig::from_file(path)
            .with_context(|| format!("設定ファイルを読み込めません: {}", path.display())),
        None => Ok(DefaultDehashConfig::default()),
    }
}

pub(crate) fn reporter(quiet: bool) -> ConsoleProgressReporter {
    if quiet {
        ConsoleProgressReporter::quiet()
    } else {
        ConsoleProgressReporter::new()
    }
}
