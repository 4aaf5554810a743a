// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! [NodeLookup] is the caller-facing retry loop of the overlay
//!
//! A single [crate::message::SingleNodeRequest] is best-effort: a walk can
//! die of hop-budget exhaustion, get dropped as a duplicate, or wander into
//! a corner of the graph with no free nodes. The lookup compensates by
//! injecting a fresh request (new id, new delivery handle, full hop budget)
//! every `lookup_frequency` until a node arrives or the caller's
//! deadline passes.

use crate::concurrency::{Duration, Instant};
use crate::config::OverlayConfig;
use crate::handle::{pending_node, LookupResult};
use crate::message::{OverlayMessage, SingleNodeRequest};
use crate::node::NodeTags;
use crate::peer::PeerCell;

/// An acquisition loop which repeatedly asks the overlay for one node
pub struct NodeLookup {
    local: PeerCell,
    tags: NodeTags,
    config: OverlayConfig,
}

impl NodeLookup {
    /// Create a lookup rooted at a local peer
    ///
    /// * `local`: The peer requests are injected into (and recorded as the
    ///   requester of)
    /// * `tags`: Tags stamped onto whichever node is eventually leased
    /// * `config`: Supplies the hop budget, retry cadence and the default
    ///   acquisition timeout
    pub fn new(local: PeerCell, tags: NodeTags, config: OverlayConfig) -> Self {
        Self {
            local,
            tags,
            config,
        }
    }

    /// Run the lookup with the configured default acquisition timeout
    pub async fn acquire(&self) -> LookupResult {
        self.acquire_within(self.config.acquisition_timeout).await
    }

    /// Run the lookup with an explicit overall deadline
    ///
    /// Returns [LookupResult::Found] with the leased node on success,
    /// [LookupResult::Timeout] if the deadline passed with no delivery, or
    /// [LookupResult::Dropped] if the local peer is stopped and requests
    /// cannot even be injected.
    pub async fn acquire_within(&self, timeout: Duration) -> LookupResult {
        let deadline = Instant::now() + timeout;
        loop {
            let (handle, receipt) = pending_node();
            let request = SingleNodeRequest::new(
                self.config.ttl,
                self.local.clone(),
                handle,
                self.tags.clone(),
            );
            let id = request.header().id();
            if self.local.send_message(request).is_err() {
                tracing::debug!("Lookup cannot reach {:?}, it has stopped", self.local);
                return LookupResult::Dropped;
            }
            tracing::debug!("Lookup injected message {} into {:?}", id, self.local);

            let now = Instant::now();
            if now >= deadline {
                return LookupResult::Timeout;
            }
            let attempt_window = (deadline - now).min(self.config.lookup_frequency);
            match receipt.wait(Some(attempt_window)).await {
                found @ LookupResult::Found(_) => return found,
                LookupResult::Timeout => {
                    tracing::debug!("Message {} produced nothing, retrying", id);
                }
                LookupResult::Dropped => {
                    // the walk died before the window elapsed; pace the
                    // retry rather than hot-looping request injections
                    tracing::debug!("Message {} died in the overlay, retrying", id);
                    let now = Instant::now();
                    if now < deadline {
                        crate::concurrency::sleep((deadline - now).min(attempt_window)).await;
                    }
                }
            }
            if Instant::now() >= deadline {
                return LookupResult::Timeout;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayConfig;
    use crate::node::NodeInfo;
    use crate::peer::Peer;
    use crate::pool::ResourcePool;

    #[tokio::test]
    async fn test_local_acquisition() {
        let config = OverlayConfig::default()
            .with_lookup_frequency(Duration::from_millis(50));
        let pool = ResourcePool::new();
        pool.add_node(NodeInfo::new("rmi://host:1099/local"));
        let (peer, handle) =
            Peer::spawn(None, pool, config.clone()).expect("Failed to spawn peer");

        let lookup = NodeLookup::new(peer.clone(), NodeTags::default(), config);
        let result = lookup.acquire_within(Duration::from_secs(5)).await;
        assert!(result.is_found());

        peer.stop(None);
        handle.await.expect("Peer stopped with err");
    }

    #[tokio::test]
    async fn test_timeout_when_overlay_is_dry() {
        let config = OverlayConfig::default()
            .with_lookup_frequency(Duration::from_millis(20));
        let (peer, handle) =
            Peer::spawn(None, ResourcePool::new(), config.clone()).expect("Failed to spawn peer");

        let lookup = NodeLookup::new(peer.clone(), NodeTags::default(), config);
        let result = lookup
            .acquire_within(Duration::from_millis(200))
            .await;
        assert!(matches!(result, LookupResult::Timeout));

        peer.stop(None);
        handle.await.expect("Peer stopped with err");
    }

    #[tokio::test]
    async fn test_dropped_when_peer_is_stopped() {
        let config = OverlayConfig::default();
        let (peer, handle) =
            Peer::spawn(None, ResourcePool::new(), config.clone()).expect("Failed to spawn peer");
        peer.stop(None);
        handle.await.expect("Peer stopped with err");

        let lookup = NodeLookup::new(peer.clone(), NodeTags::default(), config);
        let result = lookup.acquire_within(Duration::from_secs(1)).await;
        assert!(matches!(result, LookupResult::Dropped));
    }

    #[tokio::test]
    async fn test_retry_picks_up_late_capacity() {
        let config = OverlayConfig::default()
            .with_lookup_frequency(Duration::from_millis(25));
        let pool = ResourcePool::new();
        let (peer, handle) =
            Peer::spawn(None, pool.clone(), config.clone()).expect("Failed to spawn peer");

        let lookup = NodeLookup::new(peer.clone(), NodeTags::default(), config);
        let acquisition = crate::concurrency::spawn(async move {
            lookup.acquire_within(Duration::from_secs(10)).await
        });

        // capacity shows up only after the first attempts have failed
        crate::concurrency::sleep(Duration::from_millis(100)).await;
        pool.add_node(NodeInfo::new("rmi://host:1099/late"));

        let result = acquisition.await.expect("Acquisition task panicked");
        assert!(result.is_found());
        assert_eq!(1, pool.leased_count());

        result.unwrap().release();
        assert_eq!(1, pool.free_count());

        peer.stop(None);
        handle.await.expect("Peer stopped with err");
    }
}
