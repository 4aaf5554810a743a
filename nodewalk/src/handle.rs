// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! The pending-request handle: the single-acceptance slot a discovery
//! attempt ultimately fills or fails
//!
//! [pending_node] builds the pair of ends for one logical request: the
//! [RequestHandle] travels inside the request message (and is cloned into
//! every in-flight copy of it), while the [NodeReceipt] stays with the
//! caller. Any number of message copies may race to [RequestHandle::deliver];
//! exactly one wins. Losers get their [NodeLease] handed back inside the
//! error so they can return it to the pool they leased it from.
//!
//! Abandonment is simply dropping the [NodeReceipt] (e.g. on caller
//! timeout): a late delivery then fails with [DeliverErr::Abandoned] and no
//! node is leaked.

use std::fmt::Display;
use std::sync::{Arc, Mutex};

use crate::concurrency::{self, Duration, OneshotReceiver, OneshotSender};
use crate::pool::NodeLease;

/// Create the two ends of a pending single-node request
///
/// Returns a tuple of the message-side [RequestHandle] and the
/// caller-side [NodeReceipt]
pub fn pending_node() -> (RequestHandle, NodeReceipt) {
    let (tx, rx) = concurrency::oneshot();
    (
        RequestHandle {
            slot: Arc::new(Mutex::new(Some(tx))),
        },
        NodeReceipt { port: rx },
    )
}

/// The message-side end of a pending request. Clonable so every copy of a
/// request message produced by forwarding shares the same acceptance slot.
#[derive(Clone)]
pub struct RequestHandle {
    slot: Arc<Mutex<Option<OneshotSender<NodeLease>>>>,
}

impl RequestHandle {
    /// Attempt to deliver a leased node to the caller. At most one caller
    /// ever succeeds; this is safe to call concurrently from any number of
    /// racing message copies.
    ///
    /// * `lease` - The node lease to hand over
    ///
    /// Returns [Ok(())] if this delivery won the race, [Err(DeliverErr)]
    /// carrying the lease back otherwise so it can be released
    pub fn deliver(&self, lease: NodeLease) -> Result<(), DeliverErr> {
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match slot.take() {
            Some(port) => port.send(lease).map_err(DeliverErr::Abandoned),
            None => Err(DeliverErr::AlreadyFulfilled(lease)),
        }
    }

    /// Whether a delivery has already claimed this handle. Racy by nature;
    /// only useful as a fast-path skip, never as a correctness check.
    pub fn is_settled(&self) -> bool {
        match self.slot.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

impl std::fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RequestHandle ({})",
            if self.is_settled() { "settled" } else { "pending" }
        )
    }
}

/// A failed delivery, carrying the lease back for release
pub enum DeliverErr {
    /// Another message copy already fulfilled the request
    AlreadyFulfilled(NodeLease),
    /// The caller abandoned the request (dropped its [NodeReceipt])
    Abandoned(NodeLease),
}

impl DeliverErr {
    /// Consume the error, recovering the undelivered lease
    pub fn into_lease(self) -> NodeLease {
        match self {
            Self::AlreadyFulfilled(lease) => lease,
            Self::Abandoned(lease) => lease,
        }
    }
}

impl std::fmt::Debug for DeliverErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyFulfilled(_) => write!(f, "AlreadyFulfilled"),
            Self::Abandoned(_) => write!(f, "Abandoned"),
        }
    }
}

impl Display for DeliverErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyFulfilled(_) => {
                write!(f, "Delivery lost the race, the request is already fulfilled")
            }
            Self::Abandoned(_) => {
                write!(f, "Delivery arrived after the caller abandoned the request")
            }
        }
    }
}

/// The caller-side end of a pending request
pub struct NodeReceipt {
    port: OneshotReceiver<NodeLease>,
}

impl NodeReceipt {
    /// Wait for a node to be delivered, optionally up to a timeout.
    /// Consumes the receipt; dropping it instead abandons the request.
    ///
    /// * `timeout_option` - An optional [Duration] to bound the wait
    ///
    /// Returns the [LookupResult] of this single request attempt
    pub async fn wait(self, timeout_option: Option<Duration>) -> LookupResult {
        if let Some(duration) = timeout_option {
            match concurrency::timeout(duration, self.port).await {
                Ok(Ok(lease)) => LookupResult::Found(lease),
                Ok(Err(_)) => LookupResult::Dropped,
                Err(_) => LookupResult::Timeout,
            }
        } else {
            match self.port.await {
                Ok(lease) => LookupResult::Found(lease),
                Err(_) => LookupResult::Dropped,
            }
        }
    }
}

/// The result of one node-discovery attempt
#[derive(Debug)]
pub enum LookupResult {
    /// Success, with the leased node
    Found(NodeLease),
    /// No node arrived in time
    Timeout,
    /// Every in-flight copy of the request died without delivering
    Dropped,
}

impl LookupResult {
    /// Determine if the [LookupResult] is a [LookupResult::Found]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Unwrap a [LookupResult], panicking on any non-success
    pub fn unwrap(self) -> NodeLease {
        match self {
            Self::Found(lease) => lease,
            Self::Timeout => panic!("called LookupResult::unwrap() on a `Timeout` value"),
            Self::Dropped => panic!("called LookupResult::unwrap() on a `Dropped` value"),
        }
    }

    /// Unwrap a [LookupResult], panicking on non-success with the specified message
    pub fn expect(self, msg: &'static str) -> NodeLease {
        match self {
            Self::Found(lease) => lease,
            Self::Timeout => panic!("{} - called LookupResult::expect() on a `Timeout` value", msg),
            Self::Dropped => panic!("{} - called LookupResult::expect() on a `Dropped` value", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeInfo;
    use crate::pool::ResourcePool;

    #[tokio::test]
    async fn test_single_acceptance() {
        let pool = ResourcePool::new();
        pool.add_node(NodeInfo::new("rmi://host:1099/node0"));
        pool.add_node(NodeInfo::new("rmi://host:1099/node1"));

        let (handle, receipt) = pending_node();
        let first = pool.lease().unwrap();
        let second = pool.lease().unwrap();

        assert!(handle.deliver(first).is_ok());
        let lost = handle.deliver(second);
        assert!(matches!(&lost, Err(DeliverErr::AlreadyFulfilled(_))));
        lost.unwrap_err().into_lease().release();

        let lease = receipt.wait(None).await.unwrap();
        // the loser's node went home, the winner's is still out
        assert_eq!(1, pool.free_count());
        lease.release();
        assert_eq!(2, pool.free_count());
    }

    #[tokio::test]
    async fn test_concurrent_delivery_race() {
        let pool = ResourcePool::new();
        for i in 0..8 {
            pool.add_node(NodeInfo::new(format!("rmi://host:1099/node{i}")));
        }

        let (handle, receipt) = pending_node();
        let mut joins = Vec::new();
        for _ in 0..8 {
            let handle = handle.clone();
            let pool = pool.clone();
            joins.push(crate::concurrency::spawn(async move {
                let lease = pool.lease().unwrap();
                match handle.deliver(lease) {
                    Ok(()) => true,
                    Err(err) => {
                        err.into_lease().release();
                        false
                    }
                }
            }));
        }

        let mut winners = 0;
        for join in joins {
            if join.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(1, winners);

        let lease = receipt.wait(None).await.unwrap();
        // 7 losers released, 1 lease still out
        assert_eq!(7, pool.free_count());
        lease.release();
        assert_eq!(8, pool.free_count());
    }

    #[tokio::test]
    async fn test_late_delivery_after_abandonment() {
        let pool = ResourcePool::new();
        pool.add_node(NodeInfo::new("rmi://host:1099/node0"));

        let (handle, receipt) = pending_node();
        drop(receipt); // caller gave up

        let lease = pool.lease().unwrap();
        let late = handle.deliver(lease);
        assert!(matches!(&late, Err(DeliverErr::Abandoned(_))));
        late.unwrap_err().into_lease().release();
        assert_eq!(1, pool.free_count());
    }

    #[tokio::test]
    async fn test_wait_timeout() {
        let (_handle, receipt) = pending_node();
        let result = receipt.wait(Some(Duration::from_millis(50))).await;
        assert!(matches!(result, LookupResult::Timeout));
    }

    #[tokio::test]
    async fn test_wait_dropped() {
        let (handle, receipt) = pending_node();
        drop(handle);
        let result = receipt.wait(Some(Duration::from_secs(5))).await;
        assert!(matches!(result, LookupResult::Dropped));
    }
}
