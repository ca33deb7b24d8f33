use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use leetcode_sync::{GraphqlSource, SyncArgs};
use std::{env, process::ExitCode, str::FromStr};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

#[derive(Debug, Parser)]
#[command(name = "leetcode-sync")]
#[command(about = "Archive accepted LeetCode submissions as local source files")]
struct Cli {
    #[command(flatten)]
    args: SyncArgs,
}

fn init_tracing() {
    let log_level = env::var("RUST_LOG").unwrap_or(String::from("info"));
    let filter = EnvFilter::builder()
        .with_default_directive(
            LevelFilter::from_str(&log_level)
                .unwrap_or(LevelFilter::INFO)
                .into(),
        )
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true)
        .with_target(true)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = cli.args.sync_config();
    let source = GraphqlSource::new(cli.args.graphql_options()?)?;

    let result = leetcode_sync::run(&config, &source).await?;
    println!("{}", result);

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
