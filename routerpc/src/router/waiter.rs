//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Single-slot rendezvous backing synchronous calls.
//!
//! `call_wait` parks on a pooled [`Waiter`] until the reply callback fills
//! the slot or the deadline fires. Waiters are recycled, which creates a
//! race: a reply can arrive after the caller timed out and the waiter went
//! back to the pool. Two guards close it:
//!
//! - a **canceled flag**, set under the slot lock before a timed-out caller
//!   returns, which makes a late completion discard its value;
//! - an **epoch counter**, bumped on every recycle and captured at checkout,
//!   which makes a completion against a re-issued waiter stale.
//!
//! The waiter is returned to the pool unconditionally; it never leaks.

use crate::pool::{Pool, Reclaim};
use crate::router::CallError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// What a completed call delivers: the (possibly null) reply payload, or the
/// error the callback reported.
pub(crate) type CallOutcome<P> = Result<Option<P>, CallError>;

struct Slot<P> {
    epoch: u64,
    canceled: bool,
    value: Option<CallOutcome<P>>,
}

/// A reusable one-shot rendezvous between a caller and a reply callback.
pub(crate) struct Waiter<P> {
    slot: Mutex<Slot<P>>,
    notify: Notify,
}

impl<P> Waiter<P> {
    /// Returns the current epoch; completions must present it back.
    pub(crate) fn epoch(&self) -> u64 {
        self.slot.lock().epoch
    }

    /// Fills the slot and wakes the waiting caller.
    ///
    /// Discarded when `epoch` is stale (the waiter was recycled) or the slot
    /// was canceled (the caller timed out).
    pub(crate) fn complete(&self, epoch: u64, outcome: CallOutcome<P>) {
        {
            let mut slot = self.slot.lock();
            if slot.epoch != epoch || slot.canceled {
                return;
            }
            slot.value = Some(outcome);
        }
        self.notify.notify_one();
    }

    /// Waits for a completion, bounded by `timeout`.
    ///
    /// On deadline expiry the slot is marked canceled before returning, so a
    /// late completion cannot write into a recycled waiter.
    pub(crate) async fn wait(&self, timeout: Duration) -> CallOutcome<P> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            if let Some(outcome) = self.slot.lock().value.take() {
                return outcome;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                let mut slot = self.slot.lock();
                if let Some(outcome) = slot.value.take() {
                    // The completion raced the deadline and won.
                    return outcome;
                }
                slot.canceled = true;
                return Err(CallError::CallTimeout);
            }
        }
    }
}

impl<P> Default for Waiter<P> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(Slot {
                epoch: 0,
                canceled: false,
                value: None,
            }),
            notify: Notify::new(),
        }
    }
}

/// Pool checkout handle for a waiter.
pub(crate) struct PooledWaiter<P> {
    inner: Arc<Waiter<P>>,
}

impl<P> PooledWaiter<P> {
    /// Returns the shared waiter for handing to a completion callback.
    pub(crate) fn waiter(&self) -> &Arc<Waiter<P>> {
        &self.inner
    }
}

impl<P> Default for PooledWaiter<P> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Waiter::default()),
        }
    }
}

impl<P> Reclaim for PooledWaiter<P> {
    fn reset(&mut self) {
        let mut slot = self.inner.slot.lock();
        slot.epoch += 1;
        slot.canceled = false;
        slot.value = None;
    }
}

/// Bounded free list of waiters.
pub(crate) type WaiterPool<P> = Pool<PooledWaiter<P>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_complete_then_wait() {
        let waiter: Waiter<u32> = Waiter::default();
        let epoch = waiter.epoch();
        waiter.complete(epoch, Ok(Some(7)));
        assert_eq!(waiter.wait(Duration::from_secs(1)).await, Ok(Some(7)));
    }

    #[tokio::test]
    async fn test_wait_then_complete() {
        let waiter: Arc<Waiter<u32>> = Arc::new(Waiter::default());
        let epoch = waiter.epoch();
        let producer = waiter.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            producer.complete(epoch, Ok(Some(9)));
        });

        assert_eq!(waiter.wait(Duration::from_secs(5)).await, Ok(Some(9)));
    }

    #[tokio::test]
    async fn test_timeout_cancels_slot() {
        let waiter: Waiter<u32> = Waiter::default();
        let epoch = waiter.epoch();

        let outcome = waiter.wait(Duration::from_millis(10)).await;
        assert_eq!(outcome, Err(CallError::CallTimeout));

        // The late completion must be discarded.
        waiter.complete(epoch, Ok(Some(1)));
        assert!(waiter.slot.lock().value.is_none());
    }

    #[tokio::test]
    async fn test_stale_epoch_is_discarded() {
        let pool: WaiterPool<u32> = WaiterPool::new(4);
        let checked_out = pool.get();
        let stale_epoch = checked_out.waiter().epoch();
        let straggler = checked_out.waiter().clone();

        // Recycle, then check out again: the epoch has moved on.
        pool.put(checked_out);
        let reissued = pool.get();
        let fresh_epoch = reissued.waiter().epoch();
        assert_ne!(stale_epoch, fresh_epoch);

        straggler.complete(stale_epoch, Ok(Some(13)));
        assert!(reissued.waiter().slot.lock().value.is_none());

        reissued.waiter().complete(fresh_epoch, Ok(Some(14)));
        assert_eq!(
            reissued.waiter().wait(Duration::from_secs(1)).await,
            Ok(Some(14))
        );
    }

    #[tokio::test]
    async fn test_recycle_clears_canceled_flag() {
        let pool: WaiterPool<u32> = WaiterPool::new(4);
        let checked_out = pool.get();
        let _ = checked_out.waiter().wait(Duration::from_millis(5)).await;

        pool.put(checked_out);
        let reissued = pool.get();
        let epoch = reissued.waiter().epoch();
        reissued.waiter().complete(epoch, Err(CallError::Shutdown));
        assert_eq!(
            reissued.waiter().wait(Duration::from_secs(1)).await,
            Err(CallError::Shutdown)
        );
    }

    #[tokio::test]
    async fn test_error_outcome_passes_through() {
        let waiter: Waiter<u32> = Waiter::default();
        let epoch = waiter.epoch();
        waiter.complete(epoch, Err(CallError::endpoint_gone("peer")));
        assert_eq!(
            waiter.wait(Duration::from_secs(1)).await,
            Err(CallError::endpoint_gone("peer"))
        );
    }
}
