// verifyコマンド - ワードリストでルックアップテーブルを検証

use super::{load_config, reporter};
use crate::cli::args::VerifyArgs;
use crate::core::DehashConfig;
use crate::engine::VerificationEngine;
use crate::services::{HashAlgorithm, LookupEndpoint, TcpLookupClient, WordlistReader};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// 検証を実行して終了コードを返す
pub async fn execute_verify(args: VerifyArgs, config_path: Option<&Path>, quiet: bool) -> Result<i32> {
    if !args.wordlist.exists() {
        anyhow::bail!("Wordlist file does not exist: {}", args.wordlist.display());
    }

    let config = load_config(config_path)?;
    let algorithm: HashAlgorithm = args.algorithm.parse()?;
    let endpoint: LookupEndpoint = args.lookup.parse()?;

    let wordlist = WordlistReader::open(&args.wordlist).await?;
    let lookup = TcpLookupClient::connect(endpoint.clone(), config.lookup_timeout())
        .await
        .with_context(|| format!("ルックアップサービスに接続できません: {endpoint}"))?;

    info!(
        wordlist = %args.wordlist.display(),
        algorithm = %algorithm,
        lookup = %endpoint,
        "verification started"
    );

    let mut engine = VerificationEngine::new(lookup, wordlist, algorithm, &config, reporter(quiet));
    match engine.run().await {
        Ok(report) => {
            if !quiet {
                println!("\n✅ 検証完了!");
                println!("   - 一致: {}", report.matched);
                println!("   - 不一致: {}", report.mismatched);
                println!("   - 未登録: {}", report.not_found);
                println!("   - 合計: {}", report.total());
            }
            Ok(0)
        }
        // エラー内容はレポーターが表示済み
        Err(_) => Ok(1),
    }
}
