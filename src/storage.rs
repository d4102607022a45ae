//! Registry storage configuration types
//!
//! [`StorageConfig`] is a sum type: the credential payload always belongs to
//! the storage kind it is tagged with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Storage backend kinds understood by the registry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Azure Blob Storage
    Azure,
    /// Google Cloud Storage
    Gcs,
    /// Amazon S3
    S3,
    /// Pod-local ephemeral storage
    EmptyDir,
    /// Local or mounted filesystem
    Filesystem,
    /// OpenStack Swift
    Swift,
}

impl StorageKind {
    /// Wire name of the storage kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Azure => "azure",
            Self::Gcs => "gcs",
            Self::S3 => "s3",
            Self::EmptyDir => "emptydir",
            Self::Filesystem => "filesystem",
            Self::Swift => "swift",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "azure" => Ok(Self::Azure),
            "gcs" => Ok(Self::Gcs),
            "s3" => Ok(Self::S3),
            "emptydir" => Ok(Self::EmptyDir),
            "filesystem" => Ok(Self::Filesystem),
            "swift" => Ok(Self::Swift),
            other => Err(format!("unknown storage kind: {}", other)),
        }
    }
}

/// Azure Blob Storage credentials
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AzureCredentials {
    /// Storage account name
    pub account_name: String,
    /// Storage account key
    pub account_key: String,
    /// Blob container name
    pub container: String,
}

/// Google Cloud Storage credentials
#[derive(Clone, Default, PartialEq, Eq)]
pub struct GcsCredentials {
    /// Bucket name
    pub bucket: String,
    /// Service account key file contents (typically JSON)
    pub keyfile_data: String,
}

/// Amazon S3 credentials
#[derive(Clone, Default, PartialEq, Eq)]
pub struct S3Credentials {
    /// Access key ID
    pub access_key: String,
    /// Secret access key
    pub secret_key: String,
    /// Bucket name; empty until the operator picks one
    pub bucket: String,
    /// Region; empty when the install config has none
    pub region: String,
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

impl fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("account_name", &self.account_name)
            .field("account_key", &redact(&self.account_key))
            .field("container", &self.container)
            .finish()
    }
}

impl fmt::Debug for GcsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcsCredentials")
            .field("bucket", &self.bucket)
            .field("keyfile_data", &redact(&self.keyfile_data))
            .finish()
    }
}

impl fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &redact(&self.secret_key))
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish()
    }
}

/// Storage backend selection with its credentials
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageConfig {
    /// Azure Blob Storage
    Azure(AzureCredentials),
    /// Google Cloud Storage
    Gcs(GcsCredentials),
    /// Amazon S3
    S3(S3Credentials),
    /// Pod-local ephemeral storage
    EmptyDir,
    /// Local or mounted filesystem
    Filesystem,
    /// OpenStack Swift
    Swift,
}

impl StorageConfig {
    /// The storage kind this configuration is for
    pub fn kind(&self) -> StorageKind {
        match self {
            Self::Azure(_) => StorageKind::Azure,
            Self::Gcs(_) => StorageKind::Gcs,
            Self::S3(_) => StorageKind::S3,
            Self::EmptyDir => StorageKind::EmptyDir,
            Self::Filesystem => StorageKind::Filesystem,
            Self::Swift => StorageKind::Swift,
        }
    }

    /// S3 credentials, if this is an S3 configuration
    pub fn as_s3(&self) -> Option<&S3Credentials> {
        match self {
            Self::S3(s3) => Some(s3),
            _ => None,
        }
    }

    /// GCS credentials, if this is a GCS configuration
    pub fn as_gcs(&self) -> Option<&GcsCredentials> {
        match self {
            Self::Gcs(gcs) => Some(gcs),
            _ => None,
        }
    }
}

/// Result of storage resolution handed to the registry operator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Selected storage backend
    pub storage: StorageConfig,
}

impl ResolvedConfig {
    /// Wrap a storage configuration
    pub fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }

    /// Summary safe to print or log: no secret material, only whether it is set
    pub fn summary(&self) -> StorageSummary {
        let mut summary = StorageSummary {
            kind: self.storage.kind(),
            region: None,
            bucket: None,
            container: None,
            has_credentials: false,
        };
        match &self.storage {
            StorageConfig::S3(s3) => {
                summary.region = non_empty(&s3.region);
                summary.bucket = non_empty(&s3.bucket);
                summary.has_credentials = !s3.access_key.is_empty() && !s3.secret_key.is_empty();
            }
            StorageConfig::Gcs(gcs) => {
                summary.bucket = non_empty(&gcs.bucket);
                summary.has_credentials = !gcs.keyfile_data.is_empty();
            }
            StorageConfig::Azure(az) => {
                summary.container = non_empty(&az.container);
                summary.has_credentials = !az.account_name.is_empty() && !az.account_key.is_empty();
            }
            StorageConfig::EmptyDir | StorageConfig::Filesystem | StorageConfig::Swift => {}
        }
        summary
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Redacted view of a [`ResolvedConfig`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSummary {
    /// Storage kind
    #[serde(rename = "type")]
    pub kind: StorageKind,
    /// Region, when the backend has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Bucket, when already chosen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Azure container, when already chosen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    /// Whether credentials were populated
    pub has_credentials: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s3() -> S3Credentials {
        S3Credentials {
            access_key: "AKID".to_string(),
            secret_key: "SECRET".to_string(),
            bucket: String::new(),
            region: "us-east-2".to_string(),
        }
    }

    #[test]
    fn kind_follows_variant() {
        assert_eq!(StorageConfig::S3(s3()).kind(), StorageKind::S3);
        assert_eq!(
            StorageConfig::Gcs(GcsCredentials::default()).kind(),
            StorageKind::Gcs
        );
        assert_eq!(
            StorageConfig::Azure(AzureCredentials::default()).kind(),
            StorageKind::Azure
        );
        assert_eq!(StorageConfig::EmptyDir.kind(), StorageKind::EmptyDir);
        assert!(StorageConfig::EmptyDir.as_s3().is_none());
        assert!(StorageConfig::S3(s3()).as_gcs().is_none());
    }

    #[test]
    fn storage_kind_names_parse_back() {
        for kind in [
            StorageKind::Azure,
            StorageKind::Gcs,
            StorageKind::S3,
            StorageKind::EmptyDir,
            StorageKind::Filesystem,
            StorageKind::Swift,
        ] {
            assert_eq!(kind.as_str().parse::<StorageKind>(), Ok(kind));
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::Value::String(kind.to_string())
            );
        }
        assert!("nfs".parse::<StorageKind>().is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", StorageConfig::S3(s3()));
        assert!(rendered.contains("AKID"));
        assert!(rendered.contains("us-east-2"));
        assert!(!rendered.contains("SECRET"));
        assert!(rendered.contains("<redacted>"));

        let gcs = GcsCredentials {
            bucket: "b".to_string(),
            keyfile_data: "{\"private_key\":\"k\"}".to_string(),
        };
        assert!(!format!("{:?}", gcs).contains("private_key"));
    }

    #[test]
    fn summary_for_s3_omits_secrets() {
        let summary = ResolvedConfig::new(StorageConfig::S3(s3())).summary();
        assert_eq!(summary.kind, StorageKind::S3);
        assert_eq!(summary.region.as_deref(), Some("us-east-2"));
        assert_eq!(summary.bucket, None);
        assert!(summary.has_credentials);

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"type\":\"s3\""));
        assert!(json.contains("\"hasCredentials\":true"));
        assert!(!json.contains("SECRET"));
        assert!(!json.contains("AKID"));
    }

    #[test]
    fn summary_for_tag_only_gcs() {
        let summary = ResolvedConfig::new(StorageConfig::Gcs(GcsCredentials::default())).summary();
        assert_eq!(summary.kind, StorageKind::Gcs);
        assert!(!summary.has_credentials);
        assert_eq!(summary.region, None);
    }
}
