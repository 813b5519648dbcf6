//! # raft-node
//!
//! why: describe the consensus node capability that the cluster harness drives
//! relations: consumed by raft-cluster, implemented by real nodes and by InMemoryNode
//! what: Node trait, read-only Log view, LogEntry, NodeState, NodeError, in-memory node

pub mod error;
pub mod log;
pub mod memory;
pub mod node;

pub use error::NodeError;
pub use log::{Log, LogEntry};
pub use memory::InMemoryNode;
pub use node::{Node, NodeState, SubmitCallback, SubmitResult};
