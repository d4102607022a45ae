//! Error types for registry storage resolution
//!
//! Every variant carries the cluster object it concerns so a failed
//! resolution can be traced back to a specific ConfigMap, Secret or key.

use std::time::Duration;

use thiserror::Error;

/// Main error type for storage configuration resolution
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error (anything other than a 404 on a read)
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Ambient cluster credentials could not be located or loaded
    #[error("unable to configure cluster client: {message}")]
    ClientConfig {
        /// Description of what failed
        message: String,
    },

    /// The install configuration ConfigMap does not exist
    #[error("unable to read cluster install configuration: configmap {namespace}/{name} not found")]
    ConfigMapNotFound {
        /// Namespace that was searched
        namespace: String,
        /// Name of the missing ConfigMap
        name: String,
    },

    /// The install configuration ConfigMap exists but lacks the expected field
    #[error("configmap {configmap:?} does not contain required key {key:?}")]
    MissingConfigKey {
        /// ConfigMap reference as `namespace/name`
        configmap: String,
        /// The missing data key
        key: String,
    },

    /// The install configuration payload could not be decoded
    #[error("unable to decode cluster install configuration: {message}")]
    Decode {
        /// Description of the decode failure
        message: String,
    },

    /// A Secret was found but does not hold an expected key
    #[error("secret {secret:?} does not contain required key {key:?}")]
    MissingSecretKey {
        /// Secret reference as `namespace/name`
        secret: String,
        /// The missing data key
        key: String,
    },

    /// A Secret key holds bytes that are not valid UTF-8
    #[error("secret {secret:?} key {key:?} is not valid UTF-8")]
    InvalidSecretValue {
        /// Secret reference as `namespace/name`
        secret: String,
        /// The offending data key
        key: String,
    },

    /// A bounded wait elapsed before the awaited object appeared
    #[error("timed out after {waited:?} waiting for {operation}")]
    Timeout {
        /// What was being waited for
        operation: String,
        /// How long the wait lasted
        waited: Duration,
    },

    /// The cluster platform has no storage mapping
    #[error("no registry storage mapping for platform {platform:?}")]
    UnsupportedPlatform {
        /// Platform name from the install configuration
        platform: String,
    },
}

impl Error {
    /// Create a client configuration error
    pub fn client_config(msg: impl Into<String>) -> Self {
        Self::ClientConfig {
            message: msg.into(),
        }
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    /// Create a missing-key error for the Secret `namespace/name`
    pub fn missing_secret_key(namespace: &str, name: &str, key: &str) -> Self {
        Self::MissingSecretKey {
            secret: format!("{}/{}", namespace, name),
            key: key.to_string(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, waited: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            waited,
        }
    }

    /// Whether this error came from a bounded wait running out
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_secret_key_names_secret_and_key() {
        let err = Error::missing_secret_key(
            "openshift-image-registry",
            "installer-cloud-credentials",
            "aws_access_key_id",
        );
        let msg = err.to_string();
        assert!(msg.contains("openshift-image-registry/installer-cloud-credentials"));
        assert!(msg.contains("aws_access_key_id"));

        match err {
            Error::MissingSecretKey { secret, key } => {
                assert_eq!(secret, "openshift-image-registry/installer-cloud-credentials");
                assert_eq!(key, "aws_access_key_id");
            }
            other => panic!("expected MissingSecretKey, got {other:?}"),
        }
    }

    #[test]
    fn timeout_is_classified() {
        let err = Error::timeout("secret ns/name", Duration::from_secs(300));
        assert!(err.is_timeout());
        assert!(err.to_string().contains("300s"));
        assert!(err.to_string().contains("secret ns/name"));

        assert!(!Error::decode("bad yaml").is_timeout());
    }

    #[test]
    fn decode_error_carries_context() {
        let err = Error::decode("expected a mapping");
        assert_eq!(
            err.to_string(),
            "unable to decode cluster install configuration: expected a mapping"
        );
    }

    #[test]
    fn configmap_not_found_names_object() {
        let err = Error::ConfigMapNotFound {
            namespace: "kube-system".to_string(),
            name: "cluster-config-v1".to_string(),
        };
        assert!(err.to_string().contains("kube-system/cluster-config-v1"));
    }
}
