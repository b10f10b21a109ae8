//! CLI entry point for the hostwatch discovery daemon.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use hostwatch_store::StoreClient;

use hostwatch_discover::config::DiscoverConfig;
use hostwatch_discover::probe::NmapProbe;
use hostwatch_discover::reconcile;
use hostwatch_discover::scheduler::CycleScheduler;

#[derive(Parser)]
#[command(name = "hostwatch-discover")]
#[command(about = "Discovery and reconciliation daemon for the hostwatch asset inventory")]
struct Cli {
    /// Target network override (CIDR notation, e.g. 192.168.1.0/24).
    #[arg(short, long)]
    target: Option<String>,

    /// Run a single full discovery cycle and exit.
    #[arg(long)]
    once: bool,

    /// Run a single status-only cycle and exit.
    #[arg(long)]
    status: bool,

    /// Run as daemon with scheduled cycles.
    #[arg(long)]
    daemon: bool,

    /// Config file prefix (default: hostwatch).
    #[arg(short, long, default_value = "hostwatch")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let mut discover_config = load_discover_config(&cli.config)?;
    if let Some(target) = &cli.target {
        discover_config.network = target.clone();
    }
    discover_config.validate()?;

    let store = StoreClient::open(&discover_config.db_path)?;

    // Verify nmap installation before committing to a mode.
    let probe = NmapProbe::new(&discover_config);
    let version = probe.verify().await?;
    tracing::info!(nmap_version = %version.trim(), "Nmap verified");

    if cli.once {
        let summary =
            reconcile::run_full_cycle(&probe, &store, &discover_config.network).await?;
        tracing::info!(
            found = summary.found,
            added = summary.added,
            updated = summary.updated,
            offline = summary.offline,
            "One-shot full cycle finished"
        );
    } else if cli.status {
        let summary =
            reconcile::run_status_cycle(&probe, &store, &discover_config.network).await?;
        tracing::info!(
            online = summary.online,
            offline = summary.offline,
            "One-shot status cycle finished"
        );
    } else if cli.daemon {
        let sched = CycleScheduler::new(discover_config, probe, store);
        sched.run().await?;
    } else {
        anyhow::bail!(
            "Specify --once (full cycle), --status (status cycle), or --daemon (scheduled)"
        );
    }

    Ok(())
}

fn load_discover_config(file_prefix: &str) -> anyhow::Result<DiscoverConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("HOSTWATCH_DISCOVER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<DiscoverConfig>("discover") {
        Ok(c) => Ok(c),
        Err(_) => Ok(DiscoverConfig::default()),
    }
}
