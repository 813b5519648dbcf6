//! # error
//!
//! why: give node implementations one error vocabulary the harness understands
//! relations: returned by Node::bind and passed to submit callbacks
//! what: NodeError enum

use thiserror::Error;

/// errors a node reports back to whoever drives it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// the node cannot be bound to the given address
    #[error("invalid node address {addr:?}")]
    InvalidAddress { addr: String },

    /// the node is stopped and cannot accept work
    #[error("node {addr} is not running")]
    NotRunning { addr: String },

    /// the node refused the command (not leader, replication failed, ...)
    #[error("node {addr} rejected command: {reason}")]
    Rejected { addr: String, reason: String },
}

impl NodeError {
    /// create a not running error
    pub fn not_running(addr: impl Into<String>) -> Self {
        Self::NotRunning { addr: addr.into() }
    }

    /// create a rejected error
    pub fn rejected(addr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            addr: addr.into(),
            reason: reason.into(),
        }
    }
}
