//! registry-storage CLI
//!
//! Resolves the image registry storage configuration against the current
//! cluster and prints a redacted summary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use registry_storage::client::{create_client, KubeClusterClient};
use registry_storage::credentials::{CredentialSources, INSTALLER_SECRET_NAME, USER_SECRET_NAME};
use registry_storage::poll::PollPolicy;
use registry_storage::telemetry::{init_logging, LogFormat};
use registry_storage::{ResolverSettings, StorageResolver, OPERATOR_NAMESPACE};

/// Upper bound for `--poll-interval-secs` (one hour)
const MAX_POLL_INTERVAL_SECS: u64 = 60 * 60;

/// Upper bound for `--poll-timeout-secs` (one day)
const MAX_POLL_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Resolve image registry storage configuration from cluster state
#[derive(Parser, Debug)]
#[command(name = "registry-storage", version, about, long_about = None)]
struct Cli {
    /// Path to a kubeconfig; inferred from the environment when omitted
    #[arg(long, global = true, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve storage configuration and print a summary
    Resolve(ResolveArgs),
    /// Print the platform and region from the cluster install config
    InstallConfig,
}

#[derive(clap::Args, Debug)]
struct ResolveArgs {
    /// Platform to resolve for; `auto` reads it from the install config
    #[arg(long, value_enum, default_value_t = PlatformArg::Auto)]
    platform: PlatformArg,

    /// Namespace holding the credential Secrets
    #[arg(long, env = "REGISTRY_STORAGE_NAMESPACE", default_value = OPERATOR_NAMESPACE)]
    namespace: String,

    /// Name of the user-provided credentials Secret
    #[arg(long, default_value = USER_SECRET_NAME)]
    user_secret: String,

    /// Name of the installer-provisioned credentials Secret
    #[arg(long, default_value = INSTALLER_SECRET_NAME)]
    installer_secret: String,

    /// Seconds between checks for the installer Secret
    #[arg(
        long,
        env = "REGISTRY_STORAGE_POLL_INTERVAL_SECS",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..=MAX_POLL_INTERVAL_SECS)
    )]
    poll_interval_secs: u64,

    /// Seconds to wait for the installer Secret before giving up
    #[arg(
        long,
        env = "REGISTRY_STORAGE_POLL_TIMEOUT_SECS",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..=MAX_POLL_TIMEOUT_SECS)
    )]
    poll_timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PlatformArg {
    Auto,
    Aws,
    Gcp,
}

impl ResolveArgs {
    fn settings(&self) -> ResolverSettings {
        ResolverSettings {
            sources: CredentialSources {
                namespace: self.namespace.clone(),
                user_secret: self.user_secret.clone(),
                installer_secret: self.installer_secret.clone(),
            },
            poll: PollPolicy::new(
                Duration::from_secs(self.poll_interval_secs),
                Duration::from_secs(self.poll_timeout_secs),
            ),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_logging(format)?;

    let client = create_client(cli.kubeconfig.as_deref()).await?;
    let cluster = Arc::new(KubeClusterClient::new(client));

    match cli.command {
        Commands::Resolve(args) => {
            let resolver = StorageResolver::new(cluster, args.settings());
            let resolved = match args.platform {
                PlatformArg::Auto => resolver.resolve().await?,
                PlatformArg::Aws => resolver.aws_config().await?,
                PlatformArg::Gcp => resolver.gcs_config(),
            };
            println!("{}", serde_json::to_string_pretty(&resolved.summary())?);
        }
        Commands::InstallConfig => {
            let resolver = StorageResolver::new(cluster, ResolverSettings::default());
            let config = resolver.install_config().await?;
            let out = serde_json::json!({
                "cluster": config.metadata.name,
                "platform": config.platform_type().as_str(),
                "region": config.region(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_args(extra: &[&str]) -> Result<ResolveArgs, clap::Error> {
        let mut argv = vec!["registry-storage", "resolve"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv)?.command {
            Commands::Resolve(args) => Ok(args),
            other => panic!("expected resolve, got {other:?}"),
        }
    }

    #[test]
    fn test_poll_defaults() {
        let settings = resolve_args(&[]).unwrap().settings();
        assert_eq!(settings.poll, PollPolicy::default());
        assert_eq!(settings.sources, CredentialSources::default());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        assert!(resolve_args(&["--poll-interval-secs", "0"]).is_err());
        assert!(resolve_args(&["--poll-timeout-secs", "0"]).is_err());
    }

    #[test]
    fn test_oversized_poll_values_rejected() {
        assert!(resolve_args(&["--poll-timeout-secs", "18446744073709551615"]).is_err());
        assert!(resolve_args(&["--poll-interval-secs", "3601"]).is_err());
        assert!(resolve_args(&["--poll-timeout-secs", "86401"]).is_err());
    }

    #[test]
    fn test_poll_bounds_accepted() {
        let args = resolve_args(&["--poll-interval-secs", "3600", "--poll-timeout-secs", "86400"])
            .unwrap();
        assert_eq!(args.settings().poll.interval, Duration::from_secs(3600));
        assert_eq!(args.settings().poll.timeout, Duration::from_secs(86400));
    }
}
