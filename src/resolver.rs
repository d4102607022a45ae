//! Storage configuration assembly
//!
//! Reads the install config, picks the storage backend for the platform and
//! gathers its credentials. Every call reads the cluster afresh.

use std::sync::Arc;

use tracing::info;

use crate::client::ClusterClient;
use crate::credentials::{gcs_storage, resolve_s3_credentials, CredentialSources};
use crate::install_config::{read_install_config, InstallConfig, PlatformType};
use crate::poll::PollPolicy;
use crate::storage::{ResolvedConfig, StorageConfig};
use crate::Error;

/// Tunables for storage resolution
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Secrets consulted for credentials
    pub sources: CredentialSources,
    /// Wait policy for the installer Secret
    pub poll: PollPolicy,
}

/// Resolves registry storage configuration against a cluster
pub struct StorageResolver {
    client: Arc<dyn ClusterClient>,
    settings: ResolverSettings,
}

impl StorageResolver {
    /// Create a resolver over the given client
    pub fn new(client: Arc<dyn ClusterClient>, settings: ResolverSettings) -> Self {
        Self { client, settings }
    }

    /// Read the install config and resolve storage for its platform
    pub async fn resolve(&self) -> Result<ResolvedConfig, Error> {
        let install_config = self.install_config().await?;
        let platform = install_config.platform_type();
        info!(platform = %platform, "Resolving registry storage");

        match platform {
            PlatformType::Aws => self.s3_config(&install_config).await,
            PlatformType::Gcp => Ok(self.gcs_config()),
            other => Err(Error::UnsupportedPlatform {
                platform: other.to_string(),
            }),
        }
    }

    /// S3 configuration for an AWS cluster
    pub async fn aws_config(&self) -> Result<ResolvedConfig, Error> {
        let install_config = self.install_config().await?;
        self.s3_config(&install_config).await
    }

    /// GCS configuration; reads nothing from the cluster
    pub fn gcs_config(&self) -> ResolvedConfig {
        ResolvedConfig::new(gcs_storage())
    }

    /// Fetch and decode the cluster install config
    pub async fn install_config(&self) -> Result<InstallConfig, Error> {
        read_install_config(self.client.as_ref()).await
    }

    async fn s3_config(&self, install_config: &InstallConfig) -> Result<ResolvedConfig, Error> {
        let creds = resolve_s3_credentials(
            self.client.as_ref(),
            &self.settings.sources,
            &self.settings.poll,
            install_config.aws_region(),
        )
        .await?;

        info!(region = %creds.region, "Resolved S3 registry storage");
        Ok(ResolvedConfig::new(StorageConfig::S3(creds)))
    }
}
