//! # lifecycle
//!
//! why: inject faults into a running cluster and tear it down without dangling timers
//! relations: owned by cluster.rs, drives Node::stop / Node::connect on raft-node nodes
//! what: Target selector, node registry with running flags, cancellable reboot timers

use crate::error::{ClusterError, ClusterResult};
use parking_lot::Mutex;
use raft_node::{Node, NodeState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// which node a fault is aimed at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// any node, picked uniformly at random
    Random,
    /// the node bound to this address
    Addr(String),
}

impl From<&str> for Target {
    fn from(addr: &str) -> Self {
        Self::Addr(addr.to_string())
    }
}

impl From<String> for Target {
    fn from(addr: String) -> Self {
        Self::Addr(addr)
    }
}

/// an armed reboot: fires only while its generation is still registered
#[derive(Debug)]
struct RebootTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// running flags and pending reboots, indexed by node position
#[derive(Debug)]
struct Registry {
    states: Vec<NodeState>,
    timers: HashMap<usize, RebootTimer>,
    next_generation: u64,
    destroyed: bool,
}

impl Registry {
    fn cancel(&mut self, pos: usize) -> bool {
        match self.timers.remove(&pos) {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    /// claim the timer for `pos` if `generation` is still the armed one
    fn claim(&mut self, pos: usize, generation: u64) -> bool {
        if self.destroyed {
            return false;
        }
        match self.timers.get(&pos) {
            Some(timer) if timer.generation == generation => {
                self.timers.remove(&pos);
                true
            }
            _ => false,
        }
    }
}

fn stop_locked<N: Node>(registry: &mut Registry, pos: usize, node: &N) -> ClusterResult<()> {
    if registry.destroyed {
        return Err(ClusterError::Destroyed);
    }
    if registry.cancel(pos) {
        debug!(addr = %node.addr(), "cancelled pending reboot");
    }
    node.stop();
    registry.states[pos] = NodeState::Stopped;
    info!(addr = %node.addr(), "killed node");
    Ok(())
}

/// lifecycle controller for a fixed node set
///
/// every transition happens under the registry lock, including the ones
/// made by reboot timers, so kill / reboot / destroy never interleave.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    registry: Arc<Mutex<Registry>>,
}

impl Lifecycle {
    /// all `size` nodes start out running
    pub(crate) fn new(size: usize) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                states: vec![NodeState::Running; size],
                timers: HashMap::new(),
                next_generation: 0,
                destroyed: false,
            })),
        }
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.registry.lock().destroyed
    }

    pub(crate) fn state(&self, pos: usize) -> NodeState {
        self.registry.lock().states[pos]
    }

    /// number of reboot timers that have not fired yet
    pub(crate) fn pending(&self) -> usize {
        self.registry.lock().timers.len()
    }

    /// stop the node at `pos`, dropping any reboot scheduled for it
    pub(crate) fn kill<N: Node>(&self, pos: usize, node: &N) -> ClusterResult<()> {
        let mut registry = self.registry.lock();
        stop_locked(&mut registry, pos, node)
    }

    /// stop the node at `pos` and reconnect it once `delay` has passed
    ///
    /// a reboot replaces any reboot already pending for the same node.
    pub(crate) fn reboot<N: Node>(
        &self,
        pos: usize,
        node: Arc<N>,
        delay: Duration,
    ) -> ClusterResult<()> {
        let runtime = Handle::try_current().map_err(|_| ClusterError::NoRuntime)?;

        let mut registry = self.registry.lock();
        stop_locked(&mut registry, pos, node.as_ref())?;
        let generation = registry.next_generation;
        registry.next_generation += 1;

        info!(
            addr = %node.addr(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "scheduled reboot"
        );

        let shared = Arc::clone(&self.registry);
        let addr = node.addr().to_string();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            let mut registry = shared.lock();
            if !registry.claim(pos, generation) {
                debug!(addr = %addr, generation, "reboot superseded, not reconnecting");
                return;
            }
            registry.states[pos] = NodeState::Running;
            node.connect();
            info!(addr = %addr, "rebooted node reconnected");
        });
        registry.timers.insert(pos, RebootTimer { generation, handle });
        Ok(())
    }

    /// cancel every pending reboot, then stop every node in order
    ///
    /// returns false when the cluster was already destroyed.
    pub(crate) fn destroy<N: Node>(&self, nodes: &[Arc<N>]) -> bool {
        let mut registry = self.registry.lock();
        if registry.destroyed {
            return false;
        }
        registry.destroyed = true;

        let pending: Vec<usize> = registry.timers.keys().copied().collect();
        for pos in pending {
            registry.cancel(pos);
        }
        for (pos, node) in nodes.iter().enumerate() {
            node.stop();
            registry.states[pos] = NodeState::Stopped;
        }
        info!(size = nodes.len(), "destroyed cluster");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raft_node::InMemoryNode;

    fn nodes(n: usize) -> Vec<Arc<InMemoryNode>> {
        (0..n)
            .map(|i| Arc::new(InMemoryNode::new(format!("n{i}"))))
            .collect()
    }

    #[test]
    fn kill_marks_node_stopped() {
        let nodes = nodes(2);
        let lifecycle = Lifecycle::new(2);

        lifecycle.kill(1, nodes[1].as_ref()).unwrap();

        assert_eq!(lifecycle.state(0), NodeState::Running);
        assert_eq!(lifecycle.state(1), NodeState::Stopped);
        assert!(!nodes[1].is_running());
    }

    #[test]
    fn reboot_without_runtime_leaves_node_alone() {
        let nodes = nodes(1);
        let lifecycle = Lifecycle::new(1);

        let err = lifecycle
            .reboot(0, Arc::clone(&nodes[0]), Duration::from_millis(10))
            .unwrap_err();

        assert!(matches!(err, ClusterError::NoRuntime));
        assert!(nodes[0].is_running());
        assert_eq!(lifecycle.pending(), 0);
    }

    #[test]
    fn destroy_only_once() {
        let nodes = nodes(3);
        let lifecycle = Lifecycle::new(3);

        assert!(lifecycle.destroy(&nodes));
        assert!(!lifecycle.destroy(&nodes));
        assert!(nodes.iter().all(|n| n.stop_count() == 1));
        assert!(matches!(
            lifecycle.kill(0, nodes[0].as_ref()),
            Err(ClusterError::Destroyed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_reboot_does_not_fire() {
        let nodes = nodes(1);
        let lifecycle = Lifecycle::new(1);

        lifecycle.reboot(0, Arc::clone(&nodes[0]), Duration::from_millis(50)).unwrap();
        lifecycle.reboot(0, Arc::clone(&nodes[0]), Duration::from_millis(500)).unwrap();
        assert_eq!(lifecycle.pending(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(lifecycle.state(0), NodeState::Stopped);
        assert_eq!(nodes[0].connect_count(), 0);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(lifecycle.state(0), NodeState::Running);
        assert_eq!(nodes[0].connect_count(), 1);
        assert_eq!(lifecycle.pending(), 0);
    }
}
