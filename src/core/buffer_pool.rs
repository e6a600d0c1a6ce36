//! # Frame Pool Module
//!
//! This module provides the fixed-capacity pool of coded-frame buffers shared by
//! the video producer (engine context) and the decode worker.
//!
//! ## Overview
//!
//! - **Problem**: The engine delivers coded frames faster than the decoder may
//!   consume them, and it must never be blocked.
//! - **Solution**: N buffers are allocated up front. The producer takes one with
//!   a zero timeout; when none is free, the frame is dropped.
//! - **Ownership**: An acquired buffer is a move-only [`PooledBuffer`] token.
//!   Dropping the token is the only way storage goes back to the pool, so a
//!   buffer cannot be returned twice.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐  try_acquire  ┌─────────────────┐   channel    ┌─────────────────┐
//! │ Video Producer  │◀──────────────│   Frame Pool    │              │  Decode Worker  │
//! │ (engine thread) │───────────────┼─────────────────┼─────────────▶│                 │
//! └─────────────────┘ PooledBuffer  │  ┌───────────┐  │              └────────┬────────┘
//!                                   │  │ buffer 1  │  │◀──── drop(token) ────┘
//!                                   │  │ buffer N  │  │
//!                                   │  └───────────┘  │
//!                                   └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tabplay::core::buffer_pool::FramePool;
//!
//! let pool = FramePool::new(2, 1024).unwrap();
//! let mut buffer = pool.try_acquire().expect("pool starts full");
//! buffer.fill_from(b"\xFF\xD8 coded bytes").unwrap();
//! assert_eq!(pool.outstanding(), 1);
//!
//! pool.release(buffer);
//! assert_eq!(pool.available(), 2);
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::error::{PlayerError, PlayerResult};

struct PoolShared {
    free_tx: Sender<Box<[u8]>>,
    free_rx: Receiver<Box<[u8]>>,
    capacity: usize,
    buffer_size: usize,
    outstanding: AtomicUsize,
}

impl PoolShared {
    fn reclaim(&self, storage: Box<[u8]>) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
        // Cannot be full: only `capacity` buffers exist.
        if self.free_tx.try_send(storage).is_err() {
            log::error!("frame pool rejected a returned buffer");
        }
    }
}

/// A fixed-capacity pool of reusable coded-frame buffers.
///
/// Cloning the pool clones a handle; all clones share the same buffers.
///
/// # Design Principles
///
/// - **Pre-allocation**: All buffers exist from construction; the pool never grows
/// - **Bounded**: At most `capacity` buffers are outside the pool at any time
/// - **Typed ownership**: Buffers leave as [`PooledBuffer`] and come back on drop
/// - **Thread-safe**: The free list is a bounded crossbeam channel
#[derive(Clone)]
pub struct FramePool {
    shared: Arc<PoolShared>,
}

impl fmt::Debug for FramePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramePool")
            .field("capacity", &self.shared.capacity)
            .field("buffer_size", &self.shared.buffer_size)
            .field("available", &self.available())
            .finish()
    }
}

impl FramePool {
    /// Creates a pool of `capacity` buffers of `buffer_size` bytes each.
    ///
    /// # Parameters
    ///
    /// - `capacity`: Number of buffers (4 in the reference sizing)
    /// - `buffer_size`: Bytes per buffer; the largest coded frame accepted
    ///
    /// # Returns
    ///
    /// `PlayerError::Init` if either argument is zero.
    pub fn new(capacity: usize, buffer_size: usize) -> PlayerResult<Self> {
        if capacity == 0 {
            return Err(PlayerError::init("frame pool", "capacity must be non-zero"));
        }
        if buffer_size == 0 {
            return Err(PlayerError::init("frame pool", "buffer size must be non-zero"));
        }

        let (free_tx, free_rx) = bounded(capacity);
        for _ in 0..capacity {
            free_tx
                .try_send(vec![0u8; buffer_size].into_boxed_slice())
                .map_err(|e| PlayerError::init("frame pool", e))?;
        }

        Ok(Self {
            shared: Arc::new(PoolShared {
                free_tx,
                free_rx,
                capacity,
                buffer_size,
                outstanding: AtomicUsize::new(0),
            }),
        })
    }

    /// Takes a buffer, waiting up to `timeout` for one to be returned.
    ///
    /// A zero `timeout` never waits: it returns `None` straight away when the
    /// pool is empty.
    pub fn acquire(&self, timeout: Duration) -> Option<PooledBuffer> {
        let storage = if timeout.is_zero() {
            self.shared.free_rx.try_recv().ok()?
        } else {
            self.shared.free_rx.recv_timeout(timeout).ok()?
        };
        self.shared.outstanding.fetch_add(1, Ordering::AcqRel);
        Some(PooledBuffer {
            storage: Some(storage),
            len: 0,
            pool: Arc::clone(&self.shared),
        })
    }

    /// Zero-timeout acquisition used by the producer.
    ///
    /// Time complexity: O(1), never blocks.
    pub fn try_acquire(&self) -> Option<PooledBuffer> {
        self.acquire(Duration::ZERO)
    }

    /// Returns a buffer to the pool.
    ///
    /// Consumes the token; dropping it has the same effect.
    pub fn release(&self, buffer: PooledBuffer) {
        drop(buffer);
    }

    /// Buffers currently in the pool.
    pub fn available(&self) -> usize {
        self.shared.free_rx.len()
    }

    /// Buffers currently held by the producer, the channel, or the decoder.
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn buffer_size(&self) -> usize {
        self.shared.buffer_size
    }

    /// Returns `(available, capacity)`.
    pub fn stats(&self) -> (usize, usize) {
        (self.available(), self.capacity())
    }
}

/// Exclusive ownership of one pool buffer.
///
/// Not `Clone`. The storage goes back to its origin pool exactly once, when the
/// token is dropped.
pub struct PooledBuffer {
    storage: Option<Box<[u8]>>,
    len: usize,
    pool: Arc<PoolShared>,
}

impl PooledBuffer {
    /// Copies a coded payload into the buffer.
    ///
    /// Fails with `FrameTooLarge` when the payload exceeds the buffer capacity;
    /// the previous contents are then left untouched.
    pub fn fill_from(&mut self, payload: &[u8]) -> PlayerResult<()> {
        let capacity = self.capacity();
        let Some(storage) = self.storage.as_deref_mut() else {
            return Err(PlayerError::init("frame pool", "buffer storage missing"));
        };
        if payload.len() > capacity {
            return Err(PlayerError::FrameTooLarge {
                len: payload.len(),
                capacity,
            });
        }
        storage[..payload.len()].copy_from_slice(payload);
        self.len = payload.len();
        Ok(())
    }

    /// The valid payload bytes.
    pub fn payload(&self) -> &[u8] {
        match &self.storage {
            Some(storage) => &storage[..self.len],
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.storage.as_ref().map_or(0, |s| s.len())
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(storage) = self.storage.take() {
            self.pool.reclaim(storage);
        }
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_frame_pool_basic() {
        let pool = FramePool::new(3, 1024).unwrap();
        assert_eq!(pool.stats(), (3, 3));

        let mut buf = pool.try_acquire().unwrap();
        assert_eq!(buf.capacity(), 1024);
        assert!(buf.is_empty());
        buf.fill_from(&[1, 2, 3]).unwrap();
        assert_eq!(buf.payload(), &[1, 2, 3]);
        assert_eq!(pool.outstanding(), 1);
        assert_eq!(pool.available(), 2);

        pool.release(buf);
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.available(), 3);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(FramePool::new(0, 16).is_err());
        assert!(FramePool::new(4, 0).is_err());
    }

    #[test]
    fn test_empty_pool_returns_immediately() {
        let pool = FramePool::new(2, 16).unwrap();
        let _a = pool.try_acquire().unwrap();
        let _b = pool.try_acquire().unwrap();

        let start = Instant::now();
        assert!(pool.try_acquire().is_none());
        assert!(start.elapsed() < Duration::from_millis(50));
        assert_eq!(pool.outstanding(), 2);
    }

    #[test]
    fn test_acquire_waits_for_release() {
        let pool = FramePool::new(1, 16).unwrap();
        let held = pool.try_acquire().unwrap();

        let returner = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            drop(held);
        });

        let buf = pool.acquire(Duration::from_secs(2));
        assert!(buf.is_some());
        returner.join().unwrap();
    }

    #[test]
    fn test_oversize_payload_rejected() {
        let pool = FramePool::new(1, 4).unwrap();
        let mut buf = pool.try_acquire().unwrap();
        buf.fill_from(&[9, 9]).unwrap();

        let err = buf.fill_from(&[0; 5]).unwrap_err();
        assert!(matches!(err, PlayerError::FrameTooLarge { len: 5, capacity: 4 }));
        assert_eq!(buf.payload(), &[9, 9]);
    }

    #[test]
    fn test_outstanding_never_exceeds_capacity() {
        let pool = FramePool::new(4, 8).unwrap();
        let mut held = Vec::new();
        for round in 0..50 {
            if round % 3 == 0 {
                held.pop();
            }
            if let Some(buf) = pool.try_acquire() {
                held.push(buf);
            }
            assert!(pool.outstanding() <= pool.capacity());
            assert_eq!(pool.outstanding() + pool.available(), pool.capacity());
        }
        held.clear();
        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn test_buffers_cross_threads() {
        let pool = FramePool::new(4, 64).unwrap();
        let (tx, rx) = crossbeam_channel::bounded::<PooledBuffer>(4);

        let consumer = thread::spawn(move || {
            let mut seen = 0;
            while let Ok(buf) = rx.recv() {
                assert_eq!(buf.len(), 8);
                seen += 1;
            }
            seen
        });

        let mut sent = 0;
        for _ in 0..200 {
            if let Some(mut buf) = pool.try_acquire() {
                buf.fill_from(&[7; 8]).unwrap();
                tx.send(buf).unwrap();
                sent += 1;
            }
            assert!(pool.outstanding() <= 4);
        }
        drop(tx);

        assert_eq!(consumer.join().unwrap(), sent);
        assert_eq!(pool.available(), 4);
    }
}
