//! # Core Infrastructure Module
//!
//! This module contains the shared infrastructure of the playback core: the
//! coded-frame pool, the completion signal the coordinator waits on, and the
//! pipeline counters.

pub mod buffer_pool;
pub mod signal;
pub mod stats;
