//! Storage credential resolution from cluster Secrets
//!
//! ## S3 lookup order
//!
//! 1. **User Secret** (`image-registry-private-configuration-user`): keys
//!    `REGISTRY_STORAGE_S3_ACCESSKEY` / `REGISTRY_STORAGE_S3_SECRETKEY`. Takes
//!    precedence whenever it exists.
//! 2. **Installer Secret** (`installer-cloud-credentials`): keys
//!    `aws_access_key_id` / `aws_secret_access_key`. Used only when the user
//!    Secret is absent. It is written by the installer's credential
//!    provisioning, which can lag behind the operator starting, so its
//!    absence is waited out with a bounded poll.
//!
//! Any API failure other than not-found is fatal at either step.

use k8s_openapi::api::core::v1::Secret;
use tracing::{debug, info};

use crate::client::ClusterClient;
use crate::poll::{poll_until_ready, PollPolicy};
use crate::storage::{GcsCredentials, S3Credentials, StorageConfig};
use crate::Error;

/// Name of the user-provided registry credentials Secret
pub const USER_SECRET_NAME: &str = "image-registry-private-configuration-user";
/// Name of the installer-provisioned cloud credentials Secret
pub const INSTALLER_SECRET_NAME: &str = "installer-cloud-credentials";

/// Access key entry in the user Secret
pub const USER_S3_ACCESS_KEY: &str = "REGISTRY_STORAGE_S3_ACCESSKEY";
/// Secret key entry in the user Secret
pub const USER_S3_SECRET_KEY: &str = "REGISTRY_STORAGE_S3_SECRETKEY";
/// Access key entry in the installer Secret
pub const INSTALLER_AWS_ACCESS_KEY: &str = "aws_access_key_id";
/// Secret key entry in the installer Secret
pub const INSTALLER_AWS_SECRET_KEY: &str = "aws_secret_access_key";

/// Where S3 credentials are read from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialSources {
    /// Namespace holding both Secrets
    pub namespace: String,
    /// Name of the user-provided Secret
    pub user_secret: String,
    /// Name of the installer-provisioned Secret
    pub installer_secret: String,
}

impl Default for CredentialSources {
    fn default() -> Self {
        Self {
            namespace: crate::OPERATOR_NAMESPACE.to_string(),
            user_secret: USER_SECRET_NAME.to_string(),
            installer_secret: INSTALLER_SECRET_NAME.to_string(),
        }
    }
}

/// Read a required key out of a Secret's data as UTF-8
fn required_key(secret: &Secret, namespace: &str, name: &str, key: &str) -> Result<String, Error> {
    let bytes = secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .ok_or_else(|| Error::missing_secret_key(namespace, name, key))?;

    String::from_utf8(bytes.0.clone()).map_err(|_| Error::InvalidSecretValue {
        secret: format!("{}/{}", namespace, name),
        key: key.to_string(),
    })
}

/// Resolve S3 credentials, preferring the user Secret over the installer one.
///
/// `region` comes from the install config; `None` leaves the region empty.
pub async fn resolve_s3_credentials(
    client: &dyn ClusterClient,
    sources: &CredentialSources,
    poll: &PollPolicy,
    region: Option<&str>,
) -> Result<S3Credentials, Error> {
    let namespace = sources.namespace.as_str();

    let (access_key, secret_key) =
        match client.get_secret(namespace, &sources.user_secret).await? {
            Some(secret) => {
                info!(
                    namespace = %namespace,
                    secret = %sources.user_secret,
                    "Using user-provided S3 credentials"
                );
                (
                    required_key(&secret, namespace, &sources.user_secret, USER_S3_ACCESS_KEY)?,
                    required_key(&secret, namespace, &sources.user_secret, USER_S3_SECRET_KEY)?,
                )
            }
            None => {
                debug!(
                    namespace = %namespace,
                    secret = %sources.installer_secret,
                    "No user-provided credentials, waiting for installer Secret"
                );
                let secret = wait_for_secret(client, namespace, &sources.installer_secret, poll)
                    .await?;
                info!(
                    namespace = %namespace,
                    secret = %sources.installer_secret,
                    "Using installer-provisioned S3 credentials"
                );
                (
                    required_key(
                        &secret,
                        namespace,
                        &sources.installer_secret,
                        INSTALLER_AWS_ACCESS_KEY,
                    )?,
                    required_key(
                        &secret,
                        namespace,
                        &sources.installer_secret,
                        INSTALLER_AWS_SECRET_KEY,
                    )?,
                )
            }
        };

    Ok(S3Credentials {
        access_key,
        secret_key,
        bucket: String::new(),
        region: region.unwrap_or_default().to_string(),
    })
}

/// Wait for a Secret to exist and return it.
///
/// Not-found keeps the poll going; any other error ends it.
pub async fn wait_for_secret(
    client: &dyn ClusterClient,
    namespace: &str,
    name: &str,
    poll: &PollPolicy,
) -> Result<Secret, Error> {
    let operation = format!("secret {}/{}", namespace, name);
    poll_until_ready(poll, &operation, || client.get_secret(namespace, name)).await
}

/// GCS selection. Credentials are not populated and no Secret is read.
pub fn gcs_storage() -> StorageConfig {
    StorageConfig::Gcs(GcsCredentials::default())
}
