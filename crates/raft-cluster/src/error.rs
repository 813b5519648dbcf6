//! # error
//!
//! why: report harness failures explicitly instead of panicking or returning nothing
//! relations: returned by every fallible cluster operation
//! what: ClusterError enum, ClusterResult alias

use raft_node::NodeError;
use thiserror::Error;

/// errors raised by the cluster harness
#[derive(Error, Debug)]
pub enum ClusterError {
    /// bad construction input (zero size, empty or duplicate addresses, bad config)
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// no node in the cluster has this address
    #[error("no node with address {addr}")]
    NodeNotFound { addr: String },

    /// the cluster was destroyed and can no longer be used
    #[error("cluster has been destroyed")]
    Destroyed,

    /// a reboot timer needs a tokio runtime to run on
    #[error("no tokio runtime available to schedule reboot")]
    NoRuntime,

    /// the node dropped the submit callback without answering
    #[error("node {addr} dropped the submitted command without a result")]
    SubmitDropped { addr: String },

    /// error reported by a node
    #[error("node error: {0}")]
    Node(#[from] NodeError),
}

impl ClusterError {
    /// create an invalid argument error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// create a node not found error
    pub fn not_found(addr: impl Into<String>) -> Self {
        Self::NodeNotFound { addr: addr.into() }
    }
}

/// Result type for cluster operations
pub type ClusterResult<T> = std::result::Result<T, ClusterError>;
