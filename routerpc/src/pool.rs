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

//! Bounded free lists for reusable carrier objects.
//!
//! Route messages and waiters are checked out of a [`Pool`] on every call and
//! returned once the call completes, keeping allocator pressure flat under
//! high fan-in. The reservoir is strictly bounded: returning a value to a
//! full pool drops it instead of growing the reservoir.
//!
//! # Contention Policy
//!
//! Both `get` and `put` use `try_lock` on the reservoir. If the lock is
//! contended, `get` falls back to a fresh allocation and `put` drops the
//! value. The pool therefore never blocks a caller; under contention it
//! degrades to plain allocation.
//!
//! # Example
//!
//! ```rust
//! use routerpc::pool::{Pool, Reclaim};
//!
//! #[derive(Default)]
//! struct Scratch {
//!     data: Vec<u8>,
//! }
//!
//! impl Reclaim for Scratch {
//!     fn reset(&mut self) {
//!         self.data.clear();
//!     }
//! }
//!
//! let pool: Pool<Scratch> = Pool::new(16);
//! let mut scratch = pool.get();
//! scratch.data.extend_from_slice(b"payload");
//! pool.put(scratch); // reset, then returned to the reservoir
//! ```

use parking_lot::Mutex;

/// A value that can be scrubbed for reuse.
///
/// [`Pool::put`] calls `reset` before a value re-enters the reservoir, so a
/// recycled value is indistinguishable from a freshly allocated one. The
/// implementation should clear every field while retaining backing capacity
/// where that is cheap (for example `String::clear`).
pub trait Reclaim {
    /// Clears the value back to its pristine state.
    fn reset(&mut self);
}

/// A bounded free list of reusable values.
///
/// `get` pops from the reservoir, falling back to `T::default()` when the
/// reservoir is empty or contended. `put` resets the value and pushes it
/// back, dropping it when the reservoir is full or contended. The reservoir
/// never exceeds its configured capacity.
///
/// # Example
///
/// ```rust
/// use routerpc::pool::{Pool, Reclaim};
///
/// #[derive(Default)]
/// struct Counter(u64);
///
/// impl Reclaim for Counter {
///     fn reset(&mut self) {
///         self.0 = 0;
///     }
/// }
///
/// let pool: Pool<Counter> = Pool::new(2);
/// pool.put(Counter(1));
/// pool.put(Counter(2));
/// pool.put(Counter(3)); // dropped, reservoir is full
/// assert_eq!(pool.len(), 2);
/// ```
#[derive(Debug)]
pub struct Pool<T> {
    reservoir: Mutex<Vec<T>>,
    capacity: usize,
}

impl<T: Reclaim + Default> Pool<T> {
    /// Creates a pool holding at most `capacity` idle values.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            reservoir: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Checks a value out of the pool, allocating if none is available.
    #[must_use]
    pub fn get(&self) -> T {
        if let Some(mut reservoir) = self.reservoir.try_lock() {
            if let Some(value) = reservoir.pop() {
                return value;
            }
        }
        T::default()
    }

    /// Resets a value and returns it to the pool.
    ///
    /// The value is dropped when the reservoir is already at capacity or the
    /// reservoir lock is contended.
    pub fn put(&self, mut value: T) {
        value.reset();
        if let Some(mut reservoir) = self.reservoir.try_lock() {
            if reservoir.len() < self.capacity {
                reservoir.push(value);
            }
        }
    }

    /// Returns the number of idle values currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reservoir.lock().len()
    }

    /// Returns `true` if no idle values are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reservoir.lock().is_empty()
    }

    /// Returns the maximum number of idle values the pool will hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Carrier {
        field: String,
    }

    impl Reclaim for Carrier {
        fn reset(&mut self) {
            self.field.clear();
        }
    }

    #[test]
    fn test_get_allocates_when_empty() {
        let pool: Pool<Carrier> = Pool::new(4);
        let value = pool.get();
        assert!(value.field.is_empty());
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn test_put_resets_before_reuse() {
        let pool: Pool<Carrier> = Pool::new(4);
        let mut value = pool.get();
        value.field.push_str("stale");
        pool.put(value);

        let recycled = pool.get();
        assert!(recycled.field.is_empty());
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let pool: Pool<Carrier> = Pool::new(2);
        for _ in 0..8 {
            pool.put(Carrier::default());
        }
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn test_recycled_allocation_is_reused() {
        let pool: Pool<Carrier> = Pool::new(4);
        let mut value = Carrier::default();
        value.field.reserve(1024);
        let reserved = value.field.capacity();
        pool.put(value);

        let recycled = pool.get();
        assert!(recycled.field.capacity() >= reserved);
    }

    #[test]
    fn test_zero_capacity_pool_drops_everything() {
        let pool: Pool<Carrier> = Pool::new(0);
        pool.put(Carrier::default());
        assert!(pool.is_empty());
    }
}
