//! # aggregate
//!
//! why: turn per-node log state into cluster-wide quorum facts
//! relations: fed log snapshots by cluster.rs, rows rendered by inspect.rs
//! what: quorum size, majority commit index, synced set, committed entries, summaries

use crate::inspect::NodeSummary;
use raft_node::{Log, LogEntry};

/// number of nodes whose agreement is authoritative: floor(size / 2) + 1
pub fn quorum(size: usize) -> usize {
    size / 2 + 1
}

/// highest commit index reached by at least a quorum of nodes
///
/// that is the quorum-th smallest commit index. `None` only for an
/// empty slice.
pub fn committed(logs: &[Log]) -> Option<u64> {
    let mut commits: Vec<u64> = logs.iter().map(Log::commit_index).collect();
    commits.sort_unstable();
    commits.get(quorum(logs.len()) - 1).copied()
}

/// positions of the logs whose commit index is at least `committed`, in order
pub fn synced(logs: &[Log], committed: u64) -> Vec<usize> {
    logs.iter()
        .enumerate()
        .filter(|(_, log)| log.commit_index() >= committed)
        .map(|(i, _)| i)
        .collect()
}

/// entries up to and including the majority commit index
///
/// read from the first synced log. if synced logs disagree below the
/// commit index the answer depends on node order; consensus is expected
/// to rule that out and nothing here checks it.
pub fn entries(logs: &[Log]) -> Option<Vec<LogEntry>> {
    let committed = committed(logs)?;
    let first = *synced(logs, committed).first()?;
    Some(logs[first].before(committed + 1))
}

/// one summary row per node, in the order given
pub fn summaries<'a>(
    addrs: impl IntoIterator<Item = &'a str>,
    logs: &[Log],
) -> Vec<NodeSummary> {
    addrs
        .into_iter()
        .zip(logs)
        .map(|(addr, log)| NodeSummary {
            addr: addr.to_string(),
            entries: log.len(),
            commit_index: log.commit_index(),
        })
        .collect()
}
