//! # addr
//!
//! why: give auto-sized clusters stable, predictable node addresses
//! relations: used by config.rs to expand a cluster size into addresses
//! what: loopback address generator

use crate::error::{ClusterError, ClusterResult};

/// host every generated address listens on
pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// port of the first generated address
pub const BASE_PORT: u16 = 5000;

/// `n` loopback addresses on consecutive ports starting at `BASE_PORT`
pub fn addresses(n: usize) -> ClusterResult<Vec<String>> {
    if n == 0 {
        return Err(ClusterError::invalid("cluster size must be positive"));
    }
    let last = u16::try_from(n - 1)
        .ok()
        .and_then(|offset| BASE_PORT.checked_add(offset))
        .ok_or_else(|| ClusterError::invalid(format!("cluster size {n} exceeds port range")))?;

    Ok((BASE_PORT..=last)
        .map(|port| format!("{LOOPBACK_HOST}:{port}"))
        .collect())
}
