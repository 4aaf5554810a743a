// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

//! Common utilities shared among many tests

use crate::concurrency::{sleep, Duration, Instant};

pub async fn periodic_check<F>(check: F, timeout: Duration)
where
    F: Fn() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        if check() {
            break;
        }
        sleep(Duration::from_millis(50)).await;
    }
    let backtrace = backtrace::Backtrace::new();
    assert!(check(), "Periodic check failed.\n{backtrace:?}");
}
