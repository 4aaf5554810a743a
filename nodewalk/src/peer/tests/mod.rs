// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! End-to-end protocol scenarios over running peers

use async_trait::async_trait;

use crate::common_test::periodic_check;
use crate::concurrency::Duration;
use crate::config::OverlayConfig;
use crate::errors::PeerProcessingErr;
use crate::handle::{pending_node, LookupResult};
use crate::message::{Header, OverlayMessage, SingleNodeRequest};
use crate::node::{NodeInfo, NodeTags};
use crate::peer::{Peer, PeerCell, PeerStatus};
use crate::pool::ResourcePool;

fn small_config() -> OverlayConfig {
    OverlayConfig::default().with_lookup_frequency(Duration::from_millis(25))
}

/// Spawn a chain of peers where each one knows only the next
fn chain(pools: Vec<ResourcePool>, config: &OverlayConfig) -> Vec<(PeerCell, crate::concurrency::JoinHandle<()>)> {
    let spawned = pools
        .into_iter()
        .map(|pool| Peer::spawn(None, pool, config.clone()).expect("Failed to spawn peer"))
        .collect::<Vec<_>>();
    for window in spawned.windows(2) {
        window[0].0.acquaintances().insert(window[1].0.clone());
    }
    spawned
}

fn stop_all(peers: Vec<(PeerCell, crate::concurrency::JoinHandle<()>)>) {
    for (cell, _) in peers {
        cell.stop(None);
    }
}

#[tokio::test]
async fn test_local_fulfillment() {
    let pool = ResourcePool::new();
    pool.add_node(NodeInfo::new("rmi://host:1099/node0"));
    let (peer, handle) =
        Peer::spawn(None, pool.clone(), small_config()).expect("Failed to spawn peer");

    let (request_handle, receipt) = pending_node();
    let request = SingleNodeRequest::new(5, peer.clone(), request_handle, NodeTags::default());
    peer.send_message(request).expect("Failed to message peer");

    let lease = receipt
        .wait(Some(Duration::from_secs(5)))
        .await
        .expect("Node should have been found locally");
    assert_eq!("rmi://host:1099/node0", lease.info().url());
    assert_eq!(0, pool.free_count());
    lease.release();
    assert_eq!(1, pool.free_count());

    peer.stop(None);
    handle.await.expect("Peer stopped with err");
}

#[tokio::test]
async fn test_walk_reaches_a_distant_provider() {
    let config = small_config();
    let provider_pool = ResourcePool::new();
    provider_pool.add_node(NodeInfo::new("rmi://distant:1099/node0"));
    let peers = chain(
        vec![ResourcePool::new(), ResourcePool::new(), provider_pool],
        &config,
    );

    let first = peers[0].0.clone();
    let (request_handle, receipt) = pending_node();
    let request = SingleNodeRequest::new(5, first.clone(), request_handle, NodeTags::default());
    first.send_message(request).expect("Failed to message peer");

    let lease = receipt
        .wait(Some(Duration::from_secs(5)))
        .await
        .expect("The walk should have reached the provider");
    assert_eq!("rmi://distant:1099/node0", lease.info().url());

    stop_all(peers);
}

#[tokio::test]
async fn test_hop_budget_exhaustion_kills_the_walk() {
    let config = small_config();
    let provider_pool = ResourcePool::new();
    provider_pool.add_node(NodeInfo::new("rmi://too-far:1099/node0"));
    // the provider sits three forwards away from the injection point
    let peers = chain(
        vec![
            ResourcePool::new(),
            ResourcePool::new(),
            ResourcePool::new(),
            provider_pool.clone(),
        ],
        &config,
    );

    // budget 2 dies one forward short of the provider
    let first = peers[0].0.clone();
    let (request_handle, receipt) = pending_node();
    let request = SingleNodeRequest::new(2, first.clone(), request_handle, NodeTags::default());
    first.send_message(request).expect("Failed to message peer");

    let result = receipt.wait(Some(Duration::from_secs(5))).await;
    assert!(matches!(result, LookupResult::Dropped));
    assert_eq!(1, provider_pool.free_count());

    // budget 3 permits exactly 3 forwards; the injection itself is free
    let (request_handle, receipt) = pending_node();
    let request = SingleNodeRequest::new(3, first.clone(), request_handle, NodeTags::default());
    first.send_message(request).expect("Failed to message peer");
    let result = receipt.wait(Some(Duration::from_secs(5))).await;
    assert!(result.is_found());

    stop_all(peers);
}

#[tokio::test]
async fn test_duplicate_reception_is_suppressed() {
    // a peer acquainted with itself would bounce a message forever
    // if duplicate suppression failed
    let (peer, handle) =
        Peer::spawn(None, ResourcePool::new(), small_config()).expect("Failed to spawn peer");
    peer.acquaintances().insert(peer.clone());

    let (request_handle, receipt) = pending_node();
    let request = SingleNodeRequest::new(50, peer.clone(), request_handle, NodeTags::default());
    peer.send_message(request).expect("Failed to message peer");

    // second reception is recognized as old and the message dies there
    let result = receipt.wait(Some(Duration::from_secs(5))).await;
    assert!(matches!(result, LookupResult::Dropped));

    peer.stop(None);
    handle.await.expect("Peer stopped with err");
}

#[tokio::test]
async fn test_racing_copies_deliver_exactly_one_node() {
    let config = small_config();
    let pool_b = ResourcePool::new();
    pool_b.add_node(NodeInfo::new("rmi://host-b:1099/node0"));
    let pool_c = ResourcePool::new();
    pool_c.add_node(NodeInfo::new("rmi://host-c:1099/node0"));

    let (peer_a, handle_a) =
        Peer::spawn(None, ResourcePool::new(), config.clone()).expect("Failed to spawn peer");
    let (peer_b, handle_b) =
        Peer::spawn(None, pool_b.clone(), config.clone()).expect("Failed to spawn peer");
    let (peer_c, handle_c) =
        Peer::spawn(None, pool_c.clone(), config.clone()).expect("Failed to spawn peer");

    // two copies of one request race in from different walk paths
    let (request_handle, receipt) = pending_node();
    let copy_b = SingleNodeRequest::new(
        5,
        peer_a.clone(),
        request_handle.clone(),
        NodeTags::default(),
    );
    let copy_c = SingleNodeRequest::new(5, peer_a.clone(), request_handle, NodeTags::default());
    peer_b.send_message(copy_b).expect("Failed to message peer");
    peer_c.send_message(copy_c).expect("Failed to message peer");

    let lease = receipt
        .wait(Some(Duration::from_secs(5)))
        .await
        .expect("One copy should have delivered");

    // the loser's node must return to its pool
    let pools = (pool_b.clone(), pool_c.clone());
    periodic_check(
        move || pools.0.free_count() + pools.1.free_count() == 1,
        Duration::from_secs(5),
    )
    .await;

    lease.release();
    assert_eq!(2, pool_b.free_count() + pool_c.free_count());

    peer_a.stop(None);
    peer_b.stop(None);
    peer_c.stop(None);
    handle_a.await.expect("Peer stopped with err");
    handle_b.await.expect("Peer stopped with err");
    handle_c.await.expect("Peer stopped with err");
}

#[tokio::test]
async fn test_late_delivery_returns_node_after_requester_gives_up() {
    let pool = ResourcePool::new();
    pool.add_node(NodeInfo::new("rmi://host:1099/node0"));
    let (peer, handle) =
        Peer::spawn(None, pool.clone(), small_config()).expect("Failed to spawn peer");

    let (request_handle, receipt) = pending_node();
    // the requester walks away before the overlay answers
    drop(receipt);

    let request = SingleNodeRequest::new(5, peer.clone(), request_handle, NodeTags::default());
    peer.send_message(request).expect("Failed to message peer");

    let check_pool = pool.clone();
    periodic_check(
        move || check_pool.free_count() == 1,
        Duration::from_secs(5),
    )
    .await;

    peer.stop(None);
    handle.await.expect("Peer stopped with err");
}

enum Fault {
    Panic,
    Error,
}

/// A message whose local side effect always blows up
struct FaultyMessage {
    header: Header,
    fault: Fault,
}

#[async_trait]
impl OverlayMessage for FaultyMessage {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    async fn execute(&self, _peer: &Peer) -> Result<(), PeerProcessingErr> {
        match self.fault {
            Fault::Panic => panic!("Boom"),
            Fault::Error => Err("Handler failure".into()),
        }
    }

    fn transmit(self: Box<Self>, _peer: &Peer) {}
}

#[tokio::test]
async fn test_faulty_handlers_do_not_kill_the_peer() {
    let pool = ResourcePool::new();
    pool.add_node(NodeInfo::new("rmi://host:1099/node0"));
    let (peer, handle) =
        Peer::spawn(None, pool.clone(), small_config()).expect("Failed to spawn peer");

    // a panicking and an erroring handler, back to back
    peer.send_message(FaultyMessage {
        header: Header::new(5, peer.clone()),
        fault: Fault::Panic,
    })
    .expect("Failed to message peer");
    peer.send_message(FaultyMessage {
        header: Header::new(5, peer.clone()),
        fault: Fault::Error,
    })
    .expect("Failed to message peer");

    // both faults are contained; the peer still serves requests
    let (request_handle, receipt) = pending_node();
    let request = SingleNodeRequest::new(5, peer.clone(), request_handle, NodeTags::default());
    peer.send_message(request).expect("Failed to message peer");
    let lease = receipt
        .wait(Some(Duration::from_secs(5)))
        .await
        .expect("The peer should have survived the faulty handlers");
    assert_eq!(PeerStatus::Running, peer.get_status());
    lease.release();
    assert_eq!(1, pool.free_count());

    peer.stop(None);
    handle.await.expect("Peer stopped with err");
}

#[tokio::test]
async fn test_stopped_peer_rejects_traffic() {
    let (peer, handle) =
        Peer::spawn(None, ResourcePool::new(), small_config()).expect("Failed to spawn peer");
    peer.stop(None);
    handle.await.expect("Peer stopped with err");
    assert_eq!(PeerStatus::Stopped, peer.get_status());

    let (request_handle, _receipt) = pending_node();
    let request = SingleNodeRequest::new(5, peer.clone(), request_handle, NodeTags::default());
    assert!(peer.send_message(request).is_err());
}

#[tokio::test]
async fn test_acquaintance_dump_floods_the_overlay() {
    let config = small_config();
    let peers = chain(
        vec![ResourcePool::new(), ResourcePool::new(), ResourcePool::new()],
        &config,
    );

    let first = peers[0].0.clone();
    let dump = crate::message::AcquaintanceDump::new(5, first.clone());
    first.send_message(dump).expect("Failed to message peer");

    // nothing observable beyond logs; give the flood a moment then make
    // sure every peer is still healthy
    crate::concurrency::sleep(Duration::from_millis(100)).await;
    for (cell, _) in &peers {
        assert_eq!(PeerStatus::Running, cell.get_status());
    }

    stop_all(peers);
}
