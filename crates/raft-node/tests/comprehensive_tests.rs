//! # comprehensive node tests
//!
//! why: verify the in-memory node honours the contract the cluster harness relies on
//! relations: tests raft-node crate
//! what: lifecycle, peering, submit, log view and commit index scenarios

use raft_node::{InMemoryNode, Log, LogEntry, Node, NodeError, NodeState, SubmitResult};
use std::sync::mpsc;

fn submit(node: &InMemoryNode, command: &[u8]) -> SubmitResult {
    let (tx, rx) = mpsc::channel();
    node.submit(
        command.to_vec(),
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );
    rx.recv().expect("callback must be invoked")
}

// =============================================================================
// SECTION 1: LIFECYCLE TESTS
// =============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn bind_keeps_address() {
        let node = InMemoryNode::bind("127.0.0.1:5000").unwrap();
        assert_eq!(node.addr(), "127.0.0.1:5000");
        assert_eq!(node.state(), NodeState::Running);
    }

    #[test]
    fn stop_is_idempotent() {
        let node = InMemoryNode::new("127.0.0.1:5000");
        node.stop();
        node.stop();

        assert_eq!(node.state(), NodeState::Stopped);
        assert_eq!(node.stop_count(), 1);
    }

    #[test]
    fn connect_after_stop_resumes() {
        let node = InMemoryNode::new("127.0.0.1:5000");
        node.connect();
        node.stop();
        node.connect();

        assert!(node.is_running());
        assert_eq!(node.connect_count(), 2);
    }

    #[test]
    fn stopped_node_keeps_its_log() {
        let node = InMemoryNode::new("127.0.0.1:5000");
        node.append(b"a".to_vec());
        node.commit_to(1);
        node.stop();

        let log = node.log();
        assert_eq!(log.len(), 1);
        assert_eq!(log.commit_index(), 1);
    }
}

// =============================================================================
// SECTION 2: PEERING TESTS
// =============================================================================

mod peering {
    use super::*;

    #[test]
    fn peers_keep_registration_order() {
        let node = InMemoryNode::new("b");
        node.peer("a");
        node.peer("b");
        node.peer("c");

        assert_eq!(node.peers(), vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicate_peer_registered_once() {
        let node = InMemoryNode::new("a");
        node.peer("b");
        node.peer("b");

        assert_eq!(node.peers().len(), 1);
    }
}

// =============================================================================
// SECTION 3: SUBMIT TESTS
// =============================================================================

mod submitting {
    use super::*;

    #[test]
    fn submit_appends_at_next_index() {
        let node = InMemoryNode::new("a");

        assert_eq!(submit(&node, b"set x 1"), Ok(1));
        assert_eq!(submit(&node, b"set y 2"), Ok(2));

        let log = node.log();
        assert_eq!(log.entries()[1].command, b"set y 2".to_vec());
    }

    #[test]
    fn submit_does_not_commit() {
        let node = InMemoryNode::new("a");
        submit(&node, b"cmd").unwrap();

        assert_eq!(node.log().commit_index(), 0);
    }

    #[test]
    fn submit_to_stopped_node_fails() {
        let node = InMemoryNode::new("a");
        node.stop();

        assert_eq!(submit(&node, b"cmd"), Err(NodeError::not_running("a")));
        assert!(node.log().is_empty());
    }

    #[test]
    fn entries_carry_current_term() {
        let node = InMemoryNode::new("a");
        node.append(b"first".to_vec());
        node.set_term(3);
        submit(&node, b"second").unwrap();

        let terms: Vec<u64> = node.log().entries().iter().map(|e| e.term).collect();
        assert_eq!(terms, vec![1, 3]);
    }
}

// =============================================================================
// SECTION 4: LOG VIEW TESTS
// =============================================================================

mod log_view {
    use super::*;

    #[test]
    fn log_is_a_snapshot() {
        let node = InMemoryNode::new("a");
        node.append(b"one".to_vec());
        let log = node.log();

        node.append(b"two".to_vec());

        assert_eq!(log.len(), 1);
        assert_eq!(node.log().len(), 2);
    }

    #[test]
    fn before_commit_plus_one_is_committed_prefix() {
        let node = InMemoryNode::new("a");
        for cmd in [b"a", b"b", b"c", b"d"] {
            node.append(cmd.to_vec());
        }
        node.commit_to(2);

        let log = node.log();
        let committed = log.before(log.commit_index() + 1);
        assert_eq!(committed.len(), 2);
        assert_eq!(committed.last().map(|e| e.index), Some(2));
    }

    #[test]
    fn manual_log_view() {
        let log = Log::new(
            vec![LogEntry::new(1, 1, vec![1]), LogEntry::new(2, 2, vec![2])],
            1,
        );
        assert_eq!(log.last_index(), 2);
        assert_eq!(log.before(2), vec![LogEntry::new(1, 1, vec![1])]);
    }
}

// =============================================================================
// SECTION 5: COMMIT INDEX INVARIANTS
// =============================================================================

mod commit_index {
    use super::*;

    #[test]
    fn commit_never_passes_last_entry() {
        let node = InMemoryNode::new("a");
        assert_eq!(node.commit_to(5), 0);

        node.append(b"x".to_vec());
        assert_eq!(node.commit_to(5), 1);
    }

    #[test]
    fn commit_never_decreases() {
        let node = InMemoryNode::new("a");
        for _ in 0..4 {
            node.append(b"x".to_vec());
        }
        node.commit_to(3);
        node.commit_to(1);

        assert_eq!(node.log().commit_index(), 3);
    }
}
