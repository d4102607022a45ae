//! Registry storage - resolves the image registry's storage backend configuration
//!
//! The registry operator needs to know which object store backs the registry
//! and with which credentials. This crate reads the cluster install config to
//! find the cloud platform and pulls credentials out of cluster Secrets.
//!
//! # Modules
//!
//! - [`client`] - Cluster API access (ConfigMaps, Secrets) behind a mockable trait
//! - [`install_config`] - Install config ConfigMap reading and decoding
//! - [`credentials`] - Credential lookup from user and installer Secrets
//! - [`poll`] - Bounded polling for eventually-present objects
//! - [`resolver`] - Storage configuration assembly
//! - [`storage`] - Storage configuration types
//! - [`telemetry`] - Logging setup
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod client;
pub mod credentials;
pub mod error;
pub mod install_config;
pub mod poll;
pub mod resolver;
pub mod storage;
pub mod telemetry;

pub use client::{ClusterClient, KubeClusterClient};
pub use error::Error;
pub use resolver::{ResolverSettings, StorageResolver};
pub use storage::{ResolvedConfig, StorageConfig, StorageKind};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Namespace holding the installer's cluster configuration
pub const INSTALL_CONFIG_NAMESPACE: &str = "kube-system";

/// ConfigMap holding the installer's cluster configuration
pub const INSTALL_CONFIG_NAME: &str = "cluster-config-v1";

/// ConfigMap data key holding the serialized install config
pub const INSTALL_CONFIG_KEY: &str = "install-config";

/// Namespace the registry operator and its credential Secrets live in
pub const OPERATOR_NAMESPACE: &str = "openshift-image-registry";
