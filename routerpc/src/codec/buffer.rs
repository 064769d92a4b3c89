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

//! Scratch buffer pooling for codec workers.
//!
//! Decoding a frame needs a byte buffer the size of the incoming payload;
//! allocating one per frame becomes a bottleneck at high message rates. The
//! global [`BufferPool`] keeps released buffers organized by size class so
//! codecs can reuse them.
//!
//! # Example
//!
//! ```rust
//! use routerpc::codec::BufferPool;
//!
//! let mut buffer = BufferPool::get(1024);
//! buffer.extend_from_slice(b"frame payload");
//!
//! // Returned to the pool when dropped.
//! drop(buffer);
//! ```

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::OnceLock;

/// Largest buffer the pool will retain (1 MiB).
const MAX_POOLED_SIZE: usize = 1024 * 1024;

/// Maximum idle buffers kept per size class.
const MAX_BUFFERS_PER_CLASS: usize = 32;

/// Size classes for pooled buffers.
const SIZE_CLASSES: &[usize] = &[
    1024,    // 1 KiB
    16384,   // 16 KiB
    262144,  // 256 KiB
    1048576, // 1 MiB
];

/// A scratch buffer that returns to the [`BufferPool`] when dropped.
///
/// Dereferences to `Vec<u8>`, so it can be used anywhere a byte vector is
/// expected. Converting into a `Vec<u8>` with [`From`] takes ownership of
/// the allocation and skips the return to the pool.
pub struct PooledBuffer {
    buffer: Vec<u8>,
}

impl PooledBuffer {
    /// Resizes the buffer to `new_len`, zero-filling any growth.
    pub fn resize(&mut self, new_len: usize) {
        self.buffer.resize(new_len, 0);
    }
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl From<PooledBuffer> for Vec<u8> {
    fn from(mut buffer: PooledBuffer) -> Self {
        std::mem::take(&mut buffer.buffer)
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // Capacity 0 means the allocation was taken via Into<Vec<u8>>.
        if self.buffer.capacity() > 0 && self.buffer.capacity() <= MAX_POOLED_SIZE {
            BufferPool::global().return_buffer(std::mem::take(&mut self.buffer));
        }
    }
}

/// Process-wide pool of scratch buffers organized by size class.
pub struct BufferPool {
    classes: Vec<Mutex<Vec<Vec<u8>>>>,
}

impl BufferPool {
    fn global() -> &'static BufferPool {
        static POOL: OnceLock<BufferPool> = OnceLock::new();
        POOL.get_or_init(|| BufferPool {
            classes: SIZE_CLASSES.iter().map(|_| Mutex::new(Vec::new())).collect(),
        })
    }

    /// Checks out a cleared buffer with capacity for at least `size` bytes.
    ///
    /// Requests larger than the biggest size class produce an unpooled
    /// allocation that will not be retained on drop.
    #[must_use]
    pub fn get(size: usize) -> PooledBuffer {
        let pool = Self::global();
        if let Some(class) = SIZE_CLASSES.iter().position(|&c| size <= c) {
            if let Some(mut buffer) = pool.classes[class].try_lock().and_then(|mut b| b.pop()) {
                buffer.clear();
                return PooledBuffer { buffer };
            }
            return PooledBuffer {
                buffer: Vec::with_capacity(SIZE_CLASSES[class]),
            };
        }
        PooledBuffer {
            buffer: Vec::with_capacity(size),
        }
    }

    fn return_buffer(&self, buffer: Vec<u8>) {
        if let Some(class) = SIZE_CLASSES.iter().position(|&c| buffer.capacity() <= c) {
            if let Some(mut idle) = self.classes[class].try_lock() {
                if idle.len() < MAX_BUFFERS_PER_CLASS {
                    idle.push(buffer);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_cleared_buffer() {
        let buffer = BufferPool::get(64);
        assert!(buffer.is_empty());
        assert!(buffer.capacity() >= 64);
    }

    #[test]
    fn test_buffer_round_trips_through_pool() {
        let mut buffer = BufferPool::get(512);
        buffer.extend_from_slice(b"stale contents");
        drop(buffer);

        let recycled = BufferPool::get(512);
        assert!(recycled.is_empty());
    }

    #[test]
    fn test_resize_zero_fills() {
        let mut buffer = BufferPool::get(16);
        buffer.resize(16);
        assert_eq!(buffer.len(), 16);
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_into_vec_takes_ownership() {
        let mut buffer = BufferPool::get(32);
        buffer.extend_from_slice(b"taken");
        let vec: Vec<u8> = buffer.into();
        assert_eq!(vec, b"taken");
    }

    #[test]
    fn test_oversize_request_is_unpooled() {
        let buffer = BufferPool::get(MAX_POOLED_SIZE * 2);
        assert!(buffer.capacity() >= MAX_POOLED_SIZE * 2);
    }
}
