//! Cluster API access for ConfigMaps and Secrets
//!
//! The resolver only ever reads two kinds of object, so the client surface is
//! a two-method trait. Production code wraps a `kube::Client`; tests swap in
//! a mock or an in-memory fake.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::Api;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::Error;

/// Default connection timeout for kube clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default read timeout for kube clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Read access to the cluster objects storage resolution depends on
///
/// Both methods return `Ok(None)` when the object does not exist and `Err`
/// for every other failure, so callers can treat absence as a state rather
/// than an error.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Get a ConfigMap by namespace and name
    async fn get_config_map(&self, namespace: &str, name: &str)
        -> Result<Option<ConfigMap>, Error>;

    /// Get a Secret by namespace and name
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, Error>;
}

/// [`ClusterClient`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    /// Wrap an existing kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ConfigMap>, Error> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(cm) => Ok(Some(cm)),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                debug!(namespace = %namespace, configmap = %name, "ConfigMap not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, Error> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(secret) => Ok(Some(secret)),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                debug!(namespace = %namespace, secret = %name, "Secret not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Create a kube client from an optional kubeconfig path with default timeouts
///
/// Without a path the configuration is inferred: in-cluster service account
/// first, then `KUBECONFIG` / `~/.kube/config`.
pub async fn create_client(kubeconfig: Option<&Path>) -> Result<Client, Error> {
    create_client_with_timeout(kubeconfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT).await
}

/// Create a kube client from an optional kubeconfig path with custom timeouts
pub async fn create_client_with_timeout(
    kubeconfig: Option<&Path>,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, Error> {
    let mut config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                Error::client_config(format!(
                    "failed to read kubeconfig {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| Error::client_config(format!("failed to load kubeconfig: {}", e)))?
        }
        None => Config::infer()
            .await
            .map_err(|e| Error::client_config(format!("failed to infer config: {}", e)))?,
    };

    config.connect_timeout = Some(connect_timeout);
    config.read_timeout = Some(read_timeout);

    Client::try_from(config)
        .map_err(|e| Error::client_config(format!("failed to create client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_kubeconfig_path_is_client_config_error() {
        let result = create_client(Some(Path::new("/nonexistent/registry-storage/kubeconfig"))).await;
        match result {
            Err(Error::ClientConfig { message }) => {
                assert!(message.contains("failed to read kubeconfig"));
                assert!(message.contains("/nonexistent/registry-storage/kubeconfig"));
            }
            Err(other) => panic!("expected ClientConfig error, got {other:?}"),
            Ok(_) => panic!("expected an error for a missing kubeconfig"),
        }
    }
}
