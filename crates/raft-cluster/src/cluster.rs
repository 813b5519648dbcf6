//! # cluster
//!
//! why: give integration tests one handle over a whole set of consensus nodes
//! relations: builds nodes from config.rs, aggregates via aggregate.rs, faults via lifecycle.rs
//! what: Cluster facade with construction, submit, fault injection and quorum queries

use crate::aggregate;
use crate::config::ClusterConfig;
use crate::error::{ClusterError, ClusterResult};
use crate::inspect::Summary;
use crate::lifecycle::{Lifecycle, Target};
use parking_lot::Mutex;
use raft_node::{Log, LogEntry, Node, NodeError, NodeState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// A fixed set of nodes, all peered with each other, driven from a test
///
/// Quorum queries (`committed`, `synced`, `entries`, `inspect`) read each
/// node's log one after the other. Nodes keep running while that happens,
/// so one answer may mix state from slightly different moments. Good
/// enough for test assertions, not a consistent snapshot.
///
/// After `destroy` (or drop) every node is stopped and every method that
/// touches nodes returns `ClusterError::Destroyed`.
pub struct Cluster<N: Node> {
    config: ClusterConfig,
    /// cluster order, never changes after construction
    nodes: Vec<Arc<N>>,
    lifecycle: Lifecycle,
    rng: Mutex<StdRng>,
}

impl<N: Node> Cluster<N> {
    /// build a cluster binding each node with `Node::bind`
    pub fn new(config: ClusterConfig) -> ClusterResult<Self> {
        Self::with_factory(config, N::bind)
    }

    /// cluster of `n` nodes on 127.0.0.1:5000 and up
    pub fn with_size(n: usize) -> ClusterResult<Self> {
        Self::new(ClusterConfig::with_size(n))
    }

    /// cluster of exactly these addresses, in order
    pub fn with_addresses<I, S>(addrs: I) -> ClusterResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ClusterConfig::with_addresses(addrs))
    }

    /// build a cluster creating each node with `factory`
    ///
    /// every node is created before any is wired, so a failure leaves no
    /// half-connected cluster behind. each node is then told about every
    /// address in the cluster, its own included, and asked to connect.
    pub fn with_factory<F>(config: ClusterConfig, mut factory: F) -> ClusterResult<Self>
    where
        F: FnMut(&str) -> Result<N, NodeError>,
    {
        let addrs = config.addresses()?;

        let mut nodes = Vec::with_capacity(addrs.len());
        for addr in &addrs {
            let node = factory(addr)?;
            if node.addr() != addr {
                return Err(ClusterError::invalid(format!(
                    "node created for {addr} reports address {}",
                    node.addr()
                )));
            }
            nodes.push(Arc::new(node));
        }

        for node in &nodes {
            for addr in &addrs {
                node.peer(addr);
            }
            node.connect();
        }

        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        info!(size = nodes.len(), "cluster started");
        Ok(Self {
            lifecycle: Lifecycle::new(nodes.len()),
            config,
            nodes,
            rng: Mutex::new(rng),
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// number of nodes, fixed at construction
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// number of nodes whose agreement is authoritative
    pub fn quorum(&self) -> usize {
        aggregate::quorum(self.size())
    }

    /// node addresses in cluster order
    pub fn addresses(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.addr()).collect()
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle.is_destroyed()
    }

    /// the node bound to `addr`
    pub fn node(&self, addr: &str) -> ClusterResult<Arc<N>> {
        self.ensure_live()?;
        let pos = self.position(addr)?;
        Ok(Arc::clone(&self.nodes[pos]))
    }

    /// a node picked uniformly at random, stopped nodes included
    pub fn random_node(&self) -> ClusterResult<Arc<N>> {
        self.ensure_live()?;
        Ok(Arc::clone(&self.nodes[self.random_position()]))
    }

    /// whether the node at `addr` is running or stopped
    pub fn state(&self, addr: &str) -> ClusterResult<NodeState> {
        self.ensure_live()?;
        let pos = self.position(addr)?;
        Ok(self.lifecycle.state(pos))
    }

    /// stop the target node and return it
    pub fn kill(&self, target: impl Into<Target>) -> ClusterResult<Arc<N>> {
        self.ensure_live()?;
        let pos = self.resolve(&target.into())?;
        let node = &self.nodes[pos];
        self.lifecycle.kill(pos, node.as_ref())?;
        Ok(Arc::clone(node))
    }

    /// stop the target node and reconnect it after `delay`
    ///
    /// `None` or a zero delay falls back to the configured reboot delay
    /// (2s unless configured otherwise). must be called from within a
    /// tokio runtime, the reconnect runs as a task on it.
    pub fn reboot(
        &self,
        target: impl Into<Target>,
        delay: Option<Duration>,
    ) -> ClusterResult<Arc<N>> {
        self.ensure_live()?;
        let pos = self.resolve(&target.into())?;
        let delay = delay
            .filter(|d| !d.is_zero())
            .unwrap_or_else(|| self.config.reboot_delay_duration());

        let node = Arc::clone(&self.nodes[pos]);
        self.lifecycle.reboot(pos, Arc::clone(&node), delay)?;
        Ok(node)
    }

    /// reboots scheduled but not yet reconnected
    pub fn pending_reboots(&self) -> usize {
        self.lifecycle.pending()
    }

    /// stop every node and cancel pending reboots; later calls are no-ops
    pub fn destroy(&self) {
        if !self.lifecycle.destroy(&self.nodes) {
            debug!("cluster already destroyed");
        }
    }

    /// hand `command` to a random node and wait for its answer
    ///
    /// the node may be stopped, in which case its own error comes back.
    /// the answer is whatever the node reports on accepting the command,
    /// not proof that the cluster committed it.
    pub async fn submit(&self, command: impl Into<Vec<u8>>) -> ClusterResult<u64> {
        let node = self.random_node()?;
        let (tx, rx) = oneshot::channel();
        node.submit(
            command.into(),
            Box::new(move |result| {
                // the caller may have stopped waiting
                let _ = tx.send(result);
            }),
        );

        match rx.await {
            Ok(Ok(index)) => {
                debug!(addr = %node.addr(), index, "command accepted");
                Ok(index)
            }
            Ok(Err(err)) => {
                warn!(addr = %node.addr(), error = %err, "command rejected");
                Err(err.into())
            }
            Err(_) => Err(ClusterError::SubmitDropped {
                addr: node.addr().to_string(),
            }),
        }
    }

    /// highest log index committed by at least a quorum of nodes
    pub fn committed(&self) -> ClusterResult<u64> {
        let logs = self.logs()?;
        let committed = aggregate::committed(&logs).ok_or_else(empty_cluster)?;
        debug!(committed, quorum = self.quorum(), "computed majority commit");
        Ok(committed)
    }

    /// nodes whose commit index reached the majority commit, in cluster order
    ///
    /// with an odd size this always holds at least `quorum()` nodes. with
    /// an even size it can hold as few as `size() / 2`: commits
    /// `[4, 4, 1, 1]` give a majority commit of 4 and only two synced nodes.
    pub fn synced(&self) -> ClusterResult<Vec<Arc<N>>> {
        let logs = self.logs()?;
        let committed = aggregate::committed(&logs).ok_or_else(empty_cluster)?;
        Ok(aggregate::synced(&logs, committed)
            .into_iter()
            .map(|pos| Arc::clone(&self.nodes[pos]))
            .collect())
    }

    /// entries committed by a quorum, read from the first synced node
    pub fn entries(&self) -> ClusterResult<Vec<LogEntry>> {
        let logs = self.logs()?;
        aggregate::entries(&logs).ok_or_else(empty_cluster)
    }

    /// per-node entry counts and commit indices; display it for a table
    pub fn inspect(&self) -> ClusterResult<Summary> {
        let logs = self.logs()?;
        let rows = aggregate::summaries(self.nodes.iter().map(|n| n.addr()), &logs);
        Ok(Summary::new(rows))
    }

    fn logs(&self) -> ClusterResult<Vec<Log>> {
        self.ensure_live()?;
        Ok(self.nodes.iter().map(|n| n.log()).collect())
    }

    fn ensure_live(&self) -> ClusterResult<()> {
        if self.lifecycle.is_destroyed() {
            return Err(ClusterError::Destroyed);
        }
        Ok(())
    }

    fn position(&self, addr: &str) -> ClusterResult<usize> {
        self.nodes
            .iter()
            .position(|n| n.addr() == addr)
            .ok_or_else(|| ClusterError::not_found(addr))
    }

    fn random_position(&self) -> usize {
        self.rng.lock().gen_range(0..self.nodes.len())
    }

    fn resolve(&self, target: &Target) -> ClusterResult<usize> {
        match target {
            Target::Random => Ok(self.random_position()),
            Target::Addr(addr) => self.position(addr),
        }
    }
}

impl<N: Node> Drop for Cluster<N> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn empty_cluster() -> ClusterError {
    ClusterError::invalid("cluster has no nodes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use raft_node::InMemoryNode;

    #[test]
    fn construction_peers_every_node_with_every_address() {
        let cluster: Cluster<InMemoryNode> = Cluster::with_size(3).unwrap();
        let addrs = cluster.addresses();

        for addr in &addrs {
            let node = cluster.node(addr).unwrap();
            assert_eq!(node.peers(), addrs);
            assert_eq!(node.connect_count(), 1);
        }
    }

    #[test]
    fn factory_failure_aborts_construction() {
        let mut built = 0;
        let result = Cluster::<InMemoryNode>::with_factory(ClusterConfig::with_size(3), |addr| {
            built += 1;
            if built == 2 {
                return Err(NodeError::InvalidAddress { addr: addr.to_string() });
            }
            InMemoryNode::bind(addr)
        });

        assert!(matches!(
            result,
            Err(ClusterError::Node(NodeError::InvalidAddress { .. }))
        ));
    }

    #[test]
    fn factory_must_keep_address() {
        let result = Cluster::with_factory(ClusterConfig::with_size(1), |_| {
            Ok(InMemoryNode::new("elsewhere:1"))
        });
        assert!(matches!(result, Err(ClusterError::InvalidArgument { .. })));
    }

    #[test]
    fn random_position_stays_in_range() {
        let cluster: Cluster<InMemoryNode> =
            Cluster::new(ClusterConfig::with_size(4).seed(1)).unwrap();
        for _ in 0..100 {
            assert!(cluster.random_position() < 4);
        }
    }
}
