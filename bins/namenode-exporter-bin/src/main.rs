use anyhow::Context;
use clap::Parser;
use namenode_exporter::{AppState, ExporterConfig};
use std::path::PathBuf;
use std::sync::Arc;

/// Prometheus exporter for the HDFS NameNode JMX endpoint
#[derive(Parser, Debug)]
#[command(name = "namenode-exporter", version, about)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address on which to expose metrics and web interface
    #[arg(long = "web.listen-address")]
    listen_address: Option<String>,

    /// Path under which to expose metrics
    #[arg(long = "web.telemetry-path")]
    telemetry_path: Option<String>,

    /// Hadoop JMX URL
    #[arg(long = "namenode.jmx.url")]
    jmx_url: Option<String>,

    /// Dump default configuration and exit
    #[arg(long)]
    dump_default_config: bool,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<ExporterConfig> {
        let mut config = match self.config {
            Some(ref path) => ExporterConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ExporterConfig::default(),
        };

        if let Some(ref addr) = self.listen_address {
            config.listen_address = addr.clone();
        }
        if let Some(ref path) = self.telemetry_path {
            config.telemetry_path = path.clone();
        }
        if let Some(ref url) = self.jmx_url {
            config.jmx_url = url.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.dump_default_config {
        print!("{}", ExporterConfig::default().to_toml()?);
        return Ok(());
    }

    let config = args.load_config()?;
    let _log_guard = namenode_logging::init_logging(&config.log)?;

    tracing::info!(
        config = ?args.config,
        upstream = %config.jmx_url,
        "Starting NameNode exporter"
    );

    let state = Arc::new(AppState::new(config).context("initializing exporter")?);
    namenode_exporter::serve(state).await?;

    Ok(())
}
