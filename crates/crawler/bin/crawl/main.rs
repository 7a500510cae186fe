use std::sync::Arc;

use clap::Parser;
use libsonar_core::{
    adapters::{MemoryRepository, NullDecompiler, Repository},
    error::SonarError,
    types::{canonical, Address},
};
use libsonar_crawler::{config::CrawlerConfig, Crawler};
use libsonar_explorer::{config::ExplorerConfig, etherscan::EtherscanClient};
use libsonar_jsonrpc::config::JsonRpcConfig;
use libsonar_store::{config::StoreConfig, repository::SeaOrmRepository, schema::ensure_schema};
use libsonar_utils::{
    config::Config,
    log::{config::LogConfig, info},
};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(short, long, help = "root contract address")]
    address: String,

    #[arg(short, long)]
    level: Option<String>,

    #[arg(long)]
    rpc_url: Option<String>,

    #[arg(long)]
    api_key: Option<String>,

    #[arg(long)]
    chain_id: Option<u64>,

    #[arg(long)]
    database: Option<String>,

    #[arg(long)]
    max_contracts: Option<usize>,

    #[arg(long, help = "analysis scope, defaults to the root address")]
    scope: Option<String>,

    #[arg(long, default_value = "false", help = "do not write to the database")]
    dry_run: bool,
}

/// Only the database url can be overridden; `--level` is a log filter for
/// the console and the store log level stays config-driven.
fn apply_store_overrides(cfg: &mut StoreConfig, args: &Cli) {
    if let Some(url) = &args.database {
        cfg.database_url = url.clone();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    // logger
    let mut log_cfg = LogConfig::must_load_or_default();
    log_cfg.console_level = args.level.clone().unwrap_or(log_cfg.console_level);
    log_cfg.init();

    let root: Address = args
        .address
        .parse()
        .map_err(|e| SonarError::Config(format!("invalid address {}: {}", args.address, e)))?;
    let scope = args.scope.clone().unwrap_or_else(|| canonical(&root));

    // chain
    let mut rpc_cfg = JsonRpcConfig::load_or_default()?;
    rpc_cfg.url = args.rpc_url.clone().unwrap_or(rpc_cfg.url);
    let chain = Arc::new(rpc_cfg.chain_reader()?);

    // explorer
    let mut explorer_cfg = ExplorerConfig::load_or_default()?;
    explorer_cfg.chain_id = args.chain_id.unwrap_or(explorer_cfg.chain_id);
    if let Some(key) = &args.api_key {
        explorer_cfg.api_keys = vec![key.clone()];
    }
    let explorer = Arc::new(EtherscanClient::new(&explorer_cfg));

    // store
    let repository: Arc<dyn Repository> = if args.dry_run {
        Arc::new(MemoryRepository::new())
    } else {
        let mut store_cfg = StoreConfig::load_or_default()?;
        apply_store_overrides(&mut store_cfg, &args);
        let db = store_cfg.get_database_connection().await?;
        ensure_schema(&db).await?;
        info!(url = store_cfg.database_url, "database connected");
        Arc::new(SeaOrmRepository::new(db))
    };

    let mut crawler_cfg = CrawlerConfig::load_or_default()?;
    crawler_cfg.max_contracts = args.max_contracts.unwrap_or(crawler_cfg.max_contracts);

    let crawler = Crawler::new(
        crawler_cfg,
        chain,
        explorer,
        Arc::new(NullDecompiler),
        repository,
    );
    let report = crawler.crawl(&scope, root).await;

    let summary = json!({
        "scope": report.scope,
        "root": canonical(&report.root),
        "visited": report.visited,
        "remaining": report.remaining,
        "skipped": report.skipped,
        "dropped": report.dropped,
        "partial": report.is_partial(),
        "failed": report.failed.iter().map(canonical).collect::<Vec<_>>(),
        "nodes": report.graph.nodes.len(),
        "edges": report.graph.edges.len(),
        "persisted": !args.dry_run,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
