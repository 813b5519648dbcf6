//! # log
//!
//! why: expose a node's replicated log to observers without giving them write access
//! relations: produced by Node::log, aggregated by raft-cluster
//! what: LogEntry struct, Log snapshot with commit index and prefix queries

use serde::{Deserialize, Serialize};

/// A single entry in the replicated log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The term when this entry was created
    pub term: u64,
    /// The index of this entry in the log (1-indexed)
    pub index: u64,
    /// The command to be applied to the state machine
    pub command: Vec<u8>,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(term: u64, index: u64, command: Vec<u8>) -> Self {
        Self { term, index, command }
    }
}

/// read-only view of a node's log, taken at the moment `Node::log` was called
///
/// the view never changes after it is taken; later writes on the node
/// are only visible through a fresh call to `Node::log`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    entries: Vec<LogEntry>,
    commit_index: u64,
}

impl Log {
    /// build a view from entries ordered by index and the node's commit index
    pub fn new(entries: Vec<LogEntry>, commit_index: u64) -> Self {
        Self { entries, commit_index }
    }

    /// every entry the node currently holds
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// highest index the node considers committed (0 = nothing committed)
    pub fn commit_index(&self) -> u64 {
        self.commit_index
    }

    /// ordered prefix of entries whose index is strictly below `index`
    pub fn before(&self, index: u64) -> Vec<LogEntry> {
        self.entries
            .iter()
            .take_while(|e| e.index < index)
            .cloned()
            .collect()
    }

    /// index of the last entry, 0 for an empty log
    pub fn last_index(&self) -> u64 {
        self.entries.last().map_or(0, |e| e.index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
