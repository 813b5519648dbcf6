//! # raft-cluster
//!
//! why: drive a cluster of consensus nodes from integration tests
//! relations: consumes the raft-node Node capability, used by test suites
//! what: address generator, config, quorum aggregation, fault injection, Cluster facade

pub mod addr;
pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod error;
pub mod inspect;
pub mod lifecycle;

pub use addr::addresses;
pub use cluster::Cluster;
pub use config::{ClusterConfig, Members};
pub use error::{ClusterError, ClusterResult};
pub use inspect::{NodeSummary, Summary};
pub use lifecycle::Target;
pub use raft_node::{InMemoryNode, Log, LogEntry, Node, NodeError, NodeState};
