//! Cluster install configuration
//!
//! The installer leaves its configuration in the `cluster-config-v1` ConfigMap
//! in `kube-system`. Only the fields storage selection needs are modelled;
//! everything else in the document is ignored.

use std::fmt;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::client::ClusterClient;
use crate::{Error, INSTALL_CONFIG_KEY, INSTALL_CONFIG_NAME, INSTALL_CONFIG_NAMESPACE};

/// Treat an explicit `null` like an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decoded installer configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallConfig {
    /// Cluster metadata
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: InstallMetadata,
    /// Base DNS domain of the cluster
    #[serde(default, deserialize_with = "null_as_default")]
    pub base_domain: String,
    /// Target platform and its parameters
    #[serde(default, deserialize_with = "null_as_default")]
    pub platform: Platform,
}

/// Subset of object metadata carried in the install config
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct InstallMetadata {
    /// Cluster name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Platform block; exactly one member is expected to be set
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Platform {
    /// Amazon Web Services
    #[serde(default)]
    pub aws: Option<AwsPlatform>,
    /// Google Cloud Platform
    #[serde(default)]
    pub gcp: Option<GcpPlatform>,
    /// Microsoft Azure
    #[serde(default)]
    pub azure: Option<AzurePlatform>,
    /// OpenStack
    #[serde(default)]
    pub openstack: Option<OpenStackPlatform>,
    /// libvirt
    #[serde(default)]
    pub libvirt: Option<serde_json::Value>,
    /// vSphere
    #[serde(default)]
    pub vsphere: Option<serde_json::Value>,
    /// Bare metal / user provisioned with no cloud integration
    #[serde(default)]
    pub none: Option<serde_json::Value>,
}

/// AWS platform parameters
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AwsPlatform {
    /// AWS region the cluster runs in
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
}

/// GCP platform parameters
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GcpPlatform {
    /// GCP project the cluster runs in
    #[serde(default, rename = "projectID", deserialize_with = "null_as_default")]
    pub project_id: String,
    /// GCP region the cluster runs in
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
}

/// Azure platform parameters
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AzurePlatform {
    /// Azure region the cluster runs in
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
}

/// OpenStack platform parameters
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct OpenStackPlatform {
    /// OpenStack region
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
    /// Name of the cloud entry in clouds.yaml
    #[serde(default, deserialize_with = "null_as_default")]
    pub cloud: String,
}

/// Platform the cluster was installed on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlatformType {
    /// Amazon Web Services
    Aws,
    /// Google Cloud Platform
    Gcp,
    /// Microsoft Azure
    Azure,
    /// OpenStack
    OpenStack,
    /// libvirt
    Libvirt,
    /// vSphere
    VSphere,
    /// No cloud platform
    None,
    /// No recognised platform block present
    Unknown,
}

impl PlatformType {
    /// Platform name as it appears in the install config
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Gcp => "gcp",
            Self::Azure => "azure",
            Self::OpenStack => "openstack",
            Self::Libvirt => "libvirt",
            Self::VSphere => "vsphere",
            Self::None => "none",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InstallConfig {
    /// Platform selected by whichever platform block is populated
    pub fn platform_type(&self) -> PlatformType {
        let p = &self.platform;
        if p.aws.is_some() {
            PlatformType::Aws
        } else if p.gcp.is_some() {
            PlatformType::Gcp
        } else if p.azure.is_some() {
            PlatformType::Azure
        } else if p.openstack.is_some() {
            PlatformType::OpenStack
        } else if p.libvirt.is_some() {
            PlatformType::Libvirt
        } else if p.vsphere.is_some() {
            PlatformType::VSphere
        } else if p.none.is_some() {
            PlatformType::None
        } else {
            PlatformType::Unknown
        }
    }

    /// Region of the selected platform, if the platform has one
    pub fn region(&self) -> Option<&str> {
        let p = &self.platform;
        let region = match self.platform_type() {
            PlatformType::Aws => return self.aws_region(),
            PlatformType::Gcp => p.gcp.as_ref().map(|g| g.region.as_str()),
            PlatformType::Azure => p.azure.as_ref().map(|a| a.region.as_str()),
            PlatformType::OpenStack => p.openstack.as_ref().map(|o| o.region.as_str()),
            _ => None,
        };
        region.filter(|r| !r.is_empty())
    }

    /// AWS region from the `aws` block, whichever platform is selected
    pub fn aws_region(&self) -> Option<&str> {
        self.platform
            .aws
            .as_ref()
            .map(|aws| aws.region.as_str())
            .filter(|r| !r.is_empty())
    }
}

/// Decode an install config document.
///
/// Documents starting with `{` are read as JSON, anything else as YAML.
pub fn decode_install_config(text: &str) -> Result<InstallConfig, Error> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Err(Error::decode("install config document is empty"));
    }

    if trimmed.starts_with('{') {
        serde_json::from_str(trimmed).map_err(|e| Error::decode(format!("invalid JSON: {}", e)))
    } else {
        serde_yaml::from_str(trimmed).map_err(|e| Error::decode(format!("invalid YAML: {}", e)))
    }
}

/// Fetch and decode the cluster install config.
///
/// Neither a missing ConfigMap nor a decode failure is retried; the installer
/// writes the ConfigMap before the registry operator starts.
pub async fn read_install_config(client: &dyn ClusterClient) -> Result<InstallConfig, Error> {
    let cm = client
        .get_config_map(INSTALL_CONFIG_NAMESPACE, INSTALL_CONFIG_NAME)
        .await?
        .ok_or_else(|| Error::ConfigMapNotFound {
            namespace: INSTALL_CONFIG_NAMESPACE.to_string(),
            name: INSTALL_CONFIG_NAME.to_string(),
        })?;

    let text = cm
        .data
        .as_ref()
        .and_then(|d| d.get(INSTALL_CONFIG_KEY))
        .ok_or_else(|| Error::MissingConfigKey {
            configmap: format!("{}/{}", INSTALL_CONFIG_NAMESPACE, INSTALL_CONFIG_NAME),
            key: INSTALL_CONFIG_KEY.to_string(),
        })?;

    let config = decode_install_config(text)?;
    debug!(
        cluster = %config.metadata.name,
        platform = %config.platform_type(),
        region = config.region().unwrap_or(""),
        "Decoded cluster install configuration"
    );
    Ok(config)
}
