//! # memory
//!
//! why: drive the cluster harness without real networking or consensus
//! relations: implements node.rs Node, used by raft-cluster tests
//! what: InMemoryNode with test controls over its log and commit index

use crate::error::NodeError;
use crate::log::{Log, LogEntry};
use crate::node::{Node, NodeState, SubmitCallback};
use parking_lot::Mutex;
use tracing::debug;

/// in-memory node for testing
///
/// keeps everything in memory and never talks to its peers. tests move
/// its log forward with `append` and `commit_to`.
#[derive(Debug)]
pub struct InMemoryNode {
    addr: String,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: NodeState,
    peers: Vec<String>,
    connects: usize,
    stops: usize,
    term: u64,
    log: Vec<LogEntry>,
    commit_index: u64,
}

impl InMemoryNode {
    /// create an in-memory node; it counts as running until stopped
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            inner: Mutex::new(Inner {
                term: 1,
                ..Inner::default()
            }),
        }
    }

    pub fn state(&self) -> NodeState {
        self.inner.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == NodeState::Running
    }

    /// peers in registration order
    pub fn peers(&self) -> Vec<String> {
        self.inner.lock().peers.clone()
    }

    /// how many times connect() was called
    pub fn connect_count(&self) -> usize {
        self.inner.lock().connects
    }

    /// how many times stop() actually stopped a running node
    pub fn stop_count(&self) -> usize {
        self.inner.lock().stops
    }

    /// append a command at the next index, regardless of running state
    pub fn append(&self, command: impl Into<Vec<u8>>) -> u64 {
        let mut inner = self.inner.lock();
        inner.append(command.into())
    }

    /// move the commit index forward, clamped to the last index
    ///
    /// the commit index never goes backwards; returns the resulting index
    pub fn commit_to(&self, index: u64) -> u64 {
        let mut inner = self.inner.lock();
        let last = inner.log.last().map_or(0, |e| e.index);
        inner.commit_index = inner.commit_index.max(index.min(last));
        inner.commit_index
    }

    /// set the term used for subsequently appended entries
    pub fn set_term(&self, term: u64) {
        self.inner.lock().term = term;
    }
}

impl Inner {
    fn append(&mut self, command: Vec<u8>) -> u64 {
        let index = self.log.last().map_or(0, |e| e.index) + 1;
        self.log.push(LogEntry::new(self.term, index, command));
        index
    }
}

impl Node for InMemoryNode {
    fn bind(addr: &str) -> Result<Self, NodeError> {
        if addr.trim().is_empty() {
            return Err(NodeError::InvalidAddress { addr: addr.to_string() });
        }
        Ok(Self::new(addr))
    }

    fn addr(&self) -> &str {
        &self.addr
    }

    fn peer(&self, addr: &str) {
        let mut inner = self.inner.lock();
        if !inner.peers.iter().any(|p| p == addr) {
            inner.peers.push(addr.to_string());
        }
    }

    fn connect(&self) {
        let mut inner = self.inner.lock();
        inner.state = NodeState::Running;
        inner.connects += 1;
        debug!(addr = %self.addr, peers = inner.peers.len(), "in-memory node connecting");
    }

    fn stop(&self) {
        let mut inner = self.inner.lock();
        if inner.state == NodeState::Stopped {
            return;
        }
        inner.state = NodeState::Stopped;
        inner.stops += 1;
        debug!(addr = %self.addr, "in-memory node stopped");
    }

    fn log(&self) -> Log {
        let inner = self.inner.lock();
        Log::new(inner.log.clone(), inner.commit_index)
    }

    fn submit(&self, command: Vec<u8>, callback: SubmitCallback) {
        let result = {
            let mut inner = self.inner.lock();
            match inner.state {
                NodeState::Running => Ok(inner.append(command)),
                NodeState::Stopped => Err(NodeError::not_running(&self.addr)),
            }
        };
        // lock released before handing control back to the caller
        callback(result);
    }
}
