//! Client configuration.
//!
//! Environment variables read by the `from_env` constructors:
//! - `HDFS_RPC_CLIENT_NAME`: client name sent in `renewLease` and datanode
//!   requests. Defaults to `DFSClient_NONMAPREDUCE_<uuid>`.
//! - `HDFS_RPC_LEASE_RENEWAL_SECS`: seconds between lease renewals.
//!   Defaults to `30`.
//! - `HDFS_RPC_MAX_RESPONSE_LEN`: largest response frame accepted, in bytes.
//!   Defaults to 128 MiB.
//!
//! The effective user announced to the namenode comes from
//! [`NamenodeConfig::effective_user`], then `HADOOP_USER_NAME`, then `USER`.

use std::{env, str::FromStr, time::Duration};

use tracing::warn;
use uuid::Uuid;

/// Default pause between two `renewLease` calls.
pub const DEFAULT_LEASE_RENEWAL_INTERVAL: Duration = Duration::from_secs(30);

/// Default cap on a single response frame.
pub const DEFAULT_MAX_RESPONSE_LEN: usize = 128 * 1024 * 1024;

const ENV_CLIENT_NAME: &str = "HDFS_RPC_CLIENT_NAME";
const ENV_LEASE_RENEWAL_SECS: &str = "HDFS_RPC_LEASE_RENEWAL_SECS";
const ENV_MAX_RESPONSE_LEN: &str = "HDFS_RPC_MAX_RESPONSE_LEN";
const ENV_HADOOP_USER_NAME: &str = "HADOOP_USER_NAME";
const ENV_USER: &str = "USER";

/// Generate a fresh client name in the form namenodes expect from
/// non-MapReduce clients.
#[must_use]
pub fn generate_client_name() -> String {
    format!("DFSClient_NONMAPREDUCE_{}", Uuid::new_v4().simple())
}

/// Namenode connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamenodeConfig {
    /// Name under which leases are held and renewed.
    pub client_name: String,
    /// Overrides the effective user taken from the environment.
    pub effective_user: Option<String>,
    /// Pause between two lease renewals.
    pub lease_renewal_interval: Duration,
    /// Responses announcing a larger frame are rejected before allocation.
    pub max_response_len: usize,
}

impl Default for NamenodeConfig {
    fn default() -> Self {
        Self {
            client_name: generate_client_name(),
            effective_user: None,
            lease_renewal_interval: DEFAULT_LEASE_RENEWAL_INTERVAL,
            max_response_len: DEFAULT_MAX_RESPONSE_LEN,
        }
    }
}

impl NamenodeConfig {
    /// Defaults with `HDFS_RPC_*` overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(name) = env::var(ENV_CLIENT_NAME) {
            config.client_name = name;
        }
        if let Some(secs) = parse_env::<u64>(ENV_LEASE_RENEWAL_SECS) {
            config.lease_renewal_interval = Duration::from_secs(secs);
        }
        if let Some(len) = parse_env(ENV_MAX_RESPONSE_LEN) {
            config.max_response_len = len;
        }
        config
    }

    /// User announced in the connection context, resolved at connect time.
    #[must_use]
    pub fn effective_user(&self) -> Option<String> {
        self.effective_user.clone().or_else(|| {
            [ENV_HADOOP_USER_NAME, ENV_USER]
                .into_iter()
                .find_map(|key| env::var(key).ok().filter(|user| !user.is_empty()))
        })
    }
}

/// Datanode connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatanodeConfig {
    /// Name sent in the client operation header.
    pub client_name: String,
    /// Ask the datanode to stream checksums alongside block data. They are
    /// skipped, not verified.
    pub send_checksums: bool,
    /// Cap on a single varint-framed response.
    pub max_response_len: usize,
}

impl Default for DatanodeConfig {
    fn default() -> Self {
        Self {
            client_name: generate_client_name(),
            send_checksums: false,
            max_response_len: DEFAULT_MAX_RESPONSE_LEN,
        }
    }
}

impl DatanodeConfig {
    /// Defaults with `HDFS_RPC_*` overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(name) = env::var(ENV_CLIENT_NAME) {
            config.client_name = name;
        }
        if let Some(len) = parse_env(ENV_MAX_RESPONSE_LEN) {
            config.max_response_len = len;
        }
        config
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring invalid environment override");
            None
        }
    }
}
