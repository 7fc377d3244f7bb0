use anyhow::{anyhow, bail, Context, Result};
use fetch_service::{AlgodClient, IndexerClient};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wear_core::{services::Algod, Config, Discovery};

const USAGE: &str = "usage: wears [list | show <app-id> | params]";

fn load_config() -> Result<Config> {
    let config = match std::env::var("WEAR_CONFIG") {
        Ok(path) => Config::load(&path),
        Err(_) => Config::from_env(),
    };
    config.map_err(|e| anyhow!("failed to load configuration: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config()?;
    info!(indexer = %config.indexer_url, note = %config.note, min_round = config.min_round, "configuration loaded");

    let indexer = IndexerClient::new_with_endpoint(&config.indexer_url, config.indexer_token.clone());
    let discovery = Discovery::new(indexer, config.note.clone(), config.min_round);

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None | Some("list") => {
            let listings = discovery.discover().await?;
            println!("{}", serde_json::to_string_pretty(&listings)?);
        }
        Some("show") => {
            let app_id: u64 = args
                .next()
                .context(USAGE)?
                .parse()
                .context("app id must be a number")?;
            match discovery.fetch(app_id).await? {
                Some(listing) => println!("{}", serde_json::to_string_pretty(&listing)?),
                None => bail!("application {app_id} has been deleted"),
            }
        }
        Some("params") => {
            let algod = AlgodClient::new_with_endpoint(&config.algod_url, config.algod_token.clone());
            let params = algod.suggested_params().await.map_err(|e| anyhow!(e))?;
            println!("{params:#?}");
        }
        Some(other) => bail!("unknown command {other:?}\n{USAGE}"),
    }

    Ok(())
}
