//! # node
//!
//! why: define the contract every consensus node offers to an external driver
//! relations: uses log.rs for the read-only log view, error.rs for failures
//! what: Node trait, NodeState enum, submit callback types

use crate::error::NodeError;
use crate::log::Log;
use serde::{Deserialize, Serialize};

/// lifecycle state of a node as seen by whoever drives it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// connected (or connecting) to its peers and taking part in consensus
    Running,
    /// halted; its log is frozen at whatever it held when it stopped
    Stopped,
}

impl Default for NodeState {
    fn default() -> Self {
        Self::Running
    }
}

/// outcome of a submitted command: the log index it was written at
pub type SubmitResult = Result<u64, NodeError>;

/// invoked exactly once with the outcome of a submitted command
pub type SubmitCallback = Box<dyn FnOnce(SubmitResult) + Send + 'static>;

/// a consensus node that runs on its own and can be driven from outside
///
/// the node owns all of its consensus state; callers only wire peers,
/// start and stop it, read its log and hand it commands. every method
/// takes `&self` because the node keeps running between calls.
pub trait Node: Send + Sync + 'static {
    /// create a node bound to `addr`
    fn bind(addr: &str) -> Result<Self, NodeError>
    where
        Self: Sized;

    /// the address the node was bound to
    fn addr(&self) -> &str;

    /// register `addr` as a cluster member to connect to
    fn peer(&self, addr: &str);

    /// start connecting to registered peers; must not block
    fn connect(&self);

    /// stop taking part in consensus; stopping a stopped node is a no-op
    fn stop(&self);

    /// snapshot of the node's log
    fn log(&self) -> Log;

    /// submit `command` for replication, `callback` receives the outcome
    fn submit(&self, command: Vec<u8>, callback: SubmitCallback);
}
