// bulkコマンド - ドキュメントストアの未処理レコードを一括逆引き

use super::{load_config, reporter};
use crate::cli::args::BulkArgs;
use crate::core::DehashConfig;
use crate::engine::{BulkDehashEngine, BulkOutcome};
use crate::services::{DefaultDehashConfig, ElasticsearchRecordSource, LookupEndpoint, TcpLookupClient};
use anyhow::{Context, Result};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// コマンドライン指定で設定を上書きする
pub fn apply_bulk_overrides(mut config: DefaultDehashConfig, args: &BulkArgs) -> Result<DefaultDehashConfig> {
    if let Some(batch_size) = args.batch_size {
        config = config.with_batch_size(batch_size);
    }
    if args.stop_when_drained {
        config = config.with_stop_when_drained(true);
    }
    if let Some(field) = &args.digest_field {
        config = config.with_digest_field(field.clone());
    }
    if let Some(field) = &args.plaintext_field {
        config = config.with_plaintext_field(field.clone());
    }
    config.validate()?;
    Ok(config)
}

/// 一括逆引きを実行して終了コードを返す
///
/// `cancel`が発火すると処理中のバッチを書き戻してから終了する。
pub async fn execute_bulk(
    args: BulkArgs,
    config_path: Option<&Path>,
    quiet: bool,
    cancel: CancellationToken,
) -> Result<i32> {
    let config = apply_bulk_overrides(load_config(config_path)?, &args)?;
    let endpoint: LookupEndpoint = args.lookup.parse()?;

    let store = ElasticsearchRecordSource::new(&args.store_url, args.collection.clone(), &config)?;
    let lookup = TcpLookupClient::connect(endpoint.clone(), config.lookup_timeout())
        .await
        .with_context(|| format!("ルックアップサービスに接続できません: {endpoint}"))?;

    info!(
        store = %args.store_url,
        collection = %args.collection,
        lookup = %endpoint,
        batch_size = config.batch_size(),
        "bulk dehash started"
    );

    let mut engine = BulkDehashEngine::new(lookup, store, config, reporter(quiet), cancel);
    let report = engine.run().await;

    match &report.outcome {
        // エラー内容はレポーターが表示済み
        BulkOutcome::Failed { .. } => {}
        BulkOutcome::NothingProcessed => {
            eprintln!("⚠️  中断されました（処理済みレコードなし）");
        }
        BulkOutcome::Interrupted | BulkOutcome::Drained => {
            if !quiet {
                println!(
                    "\n✅ 終了: {}バッチ, {}件処理, {}件更新",
                    report.batches, report.snapshot.processed_total, report.snapshot.write_succeeded
                );
            }
        }
    }

    Ok(report.exit_code())
}
