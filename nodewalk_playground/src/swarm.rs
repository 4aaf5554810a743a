// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Overlay swarm scenarios: build a randomly-wired network of peers and
//! drive lookup traffic or a diagnostic flood through it

use nodewalk::concurrency::{Duration, JoinHandle};
use nodewalk::{
    AcquaintanceDump, NodeInfo, NodeLookup, NodeTags, OverlayConfig, Peer, PeerCell, ResourcePool,
};
use rand::seq::SliceRandom;
use rand::Rng;

const ACQUAINTANCES_PER_PEER: usize = 3;

/// Spawn `count` peers, give each `nodes_per_peer` free nodes, and wire
/// each peer to a few random others
fn build_overlay(
    count: usize,
    nodes_per_peer: usize,
    config: &OverlayConfig,
) -> Vec<(PeerCell, JoinHandle<()>)> {
    let spawned = (0..count)
        .map(|i| {
            let pool = ResourcePool::new();
            for n in 0..nodes_per_peer {
                pool.add_node(NodeInfo::new(format!("rmi://peer-{i}.example:1099/node{n}")));
            }
            Peer::spawn(Some(format!("peer-{i}")), pool, config.clone())
                .expect("Failed to spawn peer")
        })
        .collect::<Vec<_>>();

    let cells = spawned.iter().map(|(cell, _)| cell.clone()).collect::<Vec<_>>();
    let mut rng = rand::thread_rng();
    for (cell, _) in &spawned {
        let mut others = cells
            .iter()
            .filter(|candidate| candidate.get_id() != cell.get_id())
            .cloned()
            .collect::<Vec<_>>();
        others.shuffle(&mut rng);
        for other in others.into_iter().take(ACQUAINTANCES_PER_PEER) {
            cell.acquaintances().insert(other);
        }
    }
    spawned
}

fn teardown(peers: Vec<(PeerCell, JoinHandle<()>)>) {
    for (cell, _) in &peers {
        cell.stop(None);
    }
}

pub async fn run_swarm(peers: usize, nodes_per_peer: usize, lookups: usize) {
    let config = OverlayConfig::default()
        .with_lookup_frequency(Duration::from_millis(250))
        .with_acquisition_timeout(Duration::from_secs(10));
    let overlay = build_overlay(peers, nodes_per_peer, &config);
    tracing::info!(
        "Overlay up: {} peers, {} free nodes total",
        peers,
        peers * nodes_per_peer
    );

    let mut rng = rand::thread_rng();
    let mut found = 0usize;
    let mut leases = Vec::new();
    for attempt in 0..lookups {
        let entry = &overlay[rng.gen_range(0..overlay.len())].0;
        let lookup = NodeLookup::new(
            entry.clone(),
            NodeTags::new("playground", format!("job-{attempt}")),
            config.clone(),
        );
        let result = lookup.acquire().await;
        if result.is_found() {
            let lease = result.unwrap();
            tracing::info!(
                "Lookup {} through {:?} leased {}",
                attempt,
                entry,
                lease.info()
            );
            leases.push(lease);
            found += 1;
        } else {
            tracing::warn!("Lookup {} through {:?} found nothing", attempt, entry);
        }
    }
    tracing::info!("{found}/{lookups} lookups succeeded");

    for lease in leases {
        lease.release();
    }
    teardown(overlay);
}

pub async fn run_dump(peers: usize) {
    let config = OverlayConfig::default();
    let overlay = build_overlay(peers, 0, &config);

    let origin = overlay[0].0.clone();
    let dump = AcquaintanceDump::new(peers as u32, origin.clone());
    origin
        .send_message(dump)
        .expect("Failed to inject the dump");

    // let the flood settle before tearing the overlay down
    nodewalk::concurrency::sleep(Duration::from_secs(1)).await;
    teardown(overlay);
}
