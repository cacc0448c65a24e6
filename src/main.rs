//! RDAP Forge - query registration data for domains, AS numbers and IP networks
//!
//! Resolves the authoritative RDAP server through IANA bootstrap and prints
//! the object it returns as JSON.

use anyhow::Context;
use clap::Parser;
use rdap_forge::{ClientConfig, QueryTarget, RdapClient, RdapError};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rdap", version, about = "Query RDAP servers for domains, AS numbers, IP networks and entities")]
struct Cli {
    /// Domain name, AS number (e.g. AS64496), IP address, CIDR block or entity handle
    object: String,

    /// Query this RDAP server instead of resolving through bootstrap (repeatable)
    #[arg(short, long = "server", value_name = "URL")]
    servers: Vec<String>,

    /// Bootstrap URL template; `{}` is replaced by dns, asn, ipv4 or ipv6
    #[arg(long, value_name = "TEMPLATE")]
    bootstrap: Option<String>,

    /// Originating address sent as X-Forwarded-For
    #[arg(long, value_name = "IP")]
    forwarded_for: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Disable the in-memory HTTP cache
    #[arg(long)]
    no_cache: bool,

    /// Only print the candidate servers bootstrap resolves
    #[arg(long)]
    resolve: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self, mut config: ClientConfig) -> (ClientConfig, String, bool) {
        if !self.servers.is_empty() {
            config.servers = self.servers;
        }
        if let Some(template) = self.bootstrap {
            config.bootstrap_url = template;
        }
        if self.forwarded_for.is_some() {
            config.forwarded_for = self.forwarded_for;
        }
        if let Some(secs) = self.timeout {
            config.timeout = Duration::from_secs(secs);
        }
        if self.no_cache {
            config.cache = false;
        }
        (config, self.object, self.resolve)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "rdap_forge=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<RdapError>() {
            Some(rdap) => eprintln!("{}", rdap.user_message()),
            None => eprintln!("❌ Error: {:#}", e),
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    rdap_forge::init()?;
    let (config, object, resolve_only) = cli.into_config(ClientConfig::from_env()?);

    let target: QueryTarget = object.parse()?;
    let client = RdapClient::with_config(config)?;

    if resolve_only {
        for url in client.resolve(&target).await? {
            println!("{}", url);
        }
        return Ok(());
    }

    let object = client.lookup(&target).await?;
    let rendered = serde_json::to_string_pretty(&object).context("failed to render RDAP object")?;
    println!("{}", rendered);

    let stats = client.get_metrics_snapshot();
    tracing::debug!(
        bootstrap_fetches = stats.bootstrap_fetches,
        candidate_attempts = stats.candidate_attempts,
        cache_hits = stats.cache_hits,
        "Query statistics"
    );

    Ok(())
}
