//! # config
//!
//! why: describe which nodes a cluster is made of and how fault injection behaves
//! relations: consumed by cluster.rs at construction, expands sizes through addr.rs
//! what: ClusterConfig, Members, address validation, json loading

use crate::addr;
use crate::error::{ClusterError, ClusterResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// delay before a rebooted node reconnects when none is given
pub const REBOOT_DELAY_MS_DEFAULT: u64 = 2000;

/// how the node set of a cluster is given
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Members {
    /// explicit addresses, in cluster order
    Addresses(Vec<String>),
    /// number of nodes on generated loopback addresses
    Size(usize),
}

/// Configuration for a test cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// the node set
    pub members: Members,
    /// reconnect delay used by reboot when no positive delay is given
    #[serde(default = "default_reboot_delay_ms")]
    pub reboot_delay_ms: u64,
    /// seed for random node selection, entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_reboot_delay_ms() -> u64 {
    REBOOT_DELAY_MS_DEFAULT
}

impl ClusterConfig {
    /// cluster of `n` nodes on 127.0.0.1:5000 and up
    pub fn with_size(n: usize) -> Self {
        Self {
            members: Members::Size(n),
            reboot_delay_ms: REBOOT_DELAY_MS_DEFAULT,
            seed: None,
        }
    }

    /// cluster made of exactly these addresses, in this order
    pub fn with_addresses<I, S>(addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: Members::Addresses(addrs.into_iter().map(Into::into).collect()),
            reboot_delay_ms: REBOOT_DELAY_MS_DEFAULT,
            seed: None,
        }
    }

    /// Set the default reboot delay
    pub fn reboot_delay(mut self, delay: Duration) -> Self {
        self.reboot_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the random selection seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// parse a configuration from json
    pub fn from_json(json: &str) -> ClusterResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ClusterError::invalid(format!("malformed cluster config: {e}")))
    }

    /// reboot delay as a duration; 0 means `REBOOT_DELAY_MS_DEFAULT`
    pub fn reboot_delay_duration(&self) -> Duration {
        match self.reboot_delay_ms {
            0 => Duration::from_millis(REBOOT_DELAY_MS_DEFAULT),
            ms => Duration::from_millis(ms),
        }
    }

    /// the validated node addresses in cluster order
    ///
    /// sizes are expanded through the address generator; explicit lists
    /// must be non-empty and hold unique, non-blank addresses.
    pub fn addresses(&self) -> ClusterResult<Vec<String>> {
        let addrs = match &self.members {
            Members::Size(n) => addr::addresses(*n)?,
            Members::Addresses(addrs) => addrs.clone(),
        };

        if addrs.is_empty() {
            return Err(ClusterError::invalid("cluster needs at least one address"));
        }
        let mut seen = HashSet::with_capacity(addrs.len());
        for addr in &addrs {
            if addr.trim().is_empty() {
                return Err(ClusterError::invalid("node address must not be blank"));
            }
            if !seen.insert(addr.as_str()) {
                return Err(ClusterError::invalid(format!("duplicate node address {addr}")));
            }
        }
        Ok(addrs)
    }
}
