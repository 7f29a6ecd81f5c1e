//! EtherIP tunnel config sync entry point

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use etherip_sync_common::SyncError;
use tap_etherip_config_sync::config::{DEFAULT_CONFIG_PATH, DEFAULT_ENV_BASE_PATH};
use tap_etherip_config_sync::logging::{init_logging, LogFormat};
use tap_etherip_config_sync::units::DEFAULT_UNIT_PREFIX;
use tap_etherip_config_sync::{
    AddressResolver, Conf, ConfWithDns, SyncConfig, SystemResolver, SystemdHost, TunnelSyncMgr,
};
use tracing::info;

/// Reconcile declared EtherIP tunnels with the tap-etherip@ units on this host
#[derive(Parser, Debug)]
#[command(name = "tap-etherip-config-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Resolved tunnel document
    #[arg(long, env = "TAP_ETHERIP_CONFIG_SYNC_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory of the per-tunnel env files
    #[arg(
        long,
        env = "TAP_ETHERIP_CONFIG_SYNC_ENV_BASE_PATH",
        default_value = DEFAULT_ENV_BASE_PATH
    )]
    env_base_path: PathBuf,

    /// systemd template name of the backing units
    #[arg(long, env = "TAP_ETHERIP_CONFIG_SYNC_UNIT_PREFIX", default_value = DEFAULT_UNIT_PREFIX)]
    unit_prefix: String,

    /// Log the computed actions without applying them
    #[arg(long, env = "TAP_ETHERIP_CONFIG_SYNC_DRY_RUN")]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "TAP_ETHERIP_CONFIG_SYNC_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (json, pretty)
    #[arg(long, global = true, env = "TAP_ETHERIP_CONFIG_SYNC_LOG_FORMAT", default_value = "json")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a DNS-aware document on stdin, print the resolved one on stdout
    ResolveDns,
}

impl Cli {
    fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            config_path: self.config.clone(),
            env_base_path: self.env_base_path.clone(),
            unit_prefix: self.unit_prefix.clone(),
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level, cli.log_format) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Some(Command::ResolveDns) => resolve_dns().await,
        None => run(cli.sync_config()).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: SyncConfig) -> anyhow::Result<()> {
    config.validate()?;

    let conf = Conf::load(&config.config_path).map_err(|e| {
        let what = load_failure(&e);
        anyhow::Error::new(e).context(format!("{}: {}", what, config.config_path.display()))
    })?;
    info!(
        tunnels = conf.tunnels.len(),
        config = %config.config_path.display(),
        "desired tunnels loaded"
    );

    let host = SystemdHost::new(&config.unit_prefix, &config.env_base_path);
    let mut mgr = TunnelSyncMgr::new(host).with_dry_run(config.dry_run);

    let report = mgr
        .run_pass(&conf.tunnels)
        .await
        .context("failed to get current tunnels")?;
    report.log_summary();
    Ok(())
}

/// Context for a document that could not be loaded
fn load_failure(e: &SyncError) -> &'static str {
    match e {
        SyncError::DocumentIo { .. } => "failed to open config file",
        SyncError::DocumentParse { .. } => "failed to parse config file",
        _ => "invalid config file",
    }
}

async fn resolve_dns() -> anyhow::Result<()> {
    let input = ConfWithDns::from_reader(std::io::stdin().lock(), "stdin")
        .context("failed to parse input config")?;

    let output = AddressResolver::new(SystemResolver)
        .resolve_document(&input)
        .await;

    let json = output.to_pretty_json()?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(json.as_bytes())
        .context("failed to write resolved config")?;
    stdout.flush().context("failed to write resolved config")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["tap-etherip-config-sync"]).unwrap();
        let config = cli.sync_config();

        assert_eq!(config.config_path, PathBuf::from("./config.json"));
        assert_eq!(config.env_base_path, PathBuf::from("./tap-etherip-envs"));
        assert_eq!(config.unit_prefix, "tap-etherip");
        assert!(!config.dry_run);
        assert_eq!(cli.log_level, "info");
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_resolve_dns_with_global_flags() {
        let cli = Cli::try_parse_from([
            "tap-etherip-config-sync",
            "resolve-dns",
            "--log-level",
            "debug",
            "--log-format",
            "pretty",
        ])
        .unwrap();

        assert!(matches!(cli.command, Some(Command::ResolveDns)));
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[tokio::test]
    async fn test_run_names_the_load_failure() {
        let dir = tempfile::tempdir().unwrap();

        let missing = SyncConfig {
            config_path: dir.path().join("absent.json"),
            ..SyncConfig::default()
        };
        let err = run(missing).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to open config file: "));

        let garbled = dir.path().join("config.json");
        std::fs::write(&garbled, "{\"tunnels\": [").unwrap();
        let err = run(SyncConfig {
            config_path: garbled,
            ..SyncConfig::default()
        })
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("failed to parse config file: "));

        let unnamed = dir.path().join("unnamed.json");
        std::fs::write(&unnamed, r#"{"tunnels": [{"local_ip_addr": "a"}]}"#).unwrap();
        let err = run(SyncConfig {
            config_path: unnamed,
            ..SyncConfig::default()
        })
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("invalid config file: "));
    }

    #[test]
    fn test_cli_rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["tap-etherip-config-sync", "--log-format", "xml"]).is_err());
    }
}
