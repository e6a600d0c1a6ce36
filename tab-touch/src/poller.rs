// SPDX-License-Identifier: MIT
//! # Touch Polling Thread
//!
//! The poller blocks on a [`TouchSource`] until the panel signals new data, then
//! feeds the sample through a [`TouchDispatcher`]. It does no work between
//! samples.
//!
//! ## Threading Behavior
//!
//! - **touch-poller thread**: owns the source and the dispatcher
//! - **Listener**: runs synchronously on the poller thread
//! - **Shutdown**: the thread exits when the source reports end of input
//!   (`Ok(None)`) or a fatal error

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use thiserror::Error;

use crate::dispatch::TouchDispatcher;
use crate::gesture::Point;

/// Errors surfaced by a touch source.
#[derive(Debug, Error)]
pub enum TouchError {
    /// The panel could not be read this tick; the poller keeps going.
    #[error("touch read failed: {0}")]
    Read(String),

    /// The panel is gone; the poller stops.
    #[error("touch device lost: {0}")]
    DeviceLost(String),
}

impl TouchError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, TouchError::DeviceLost(_))
    }
}

/// A blocking producer of contact samples.
///
/// `next_sample` waits for the next panel interrupt and returns every contact
/// currently reported, possibly none. `Ok(None)` ends polling.
pub trait TouchSource: Send {
    fn next_sample(&mut self) -> Result<Option<Vec<Point>>, TouchError>;
}

/// Source backed by a channel, one message per interrupt.
///
/// When `tick` is set and no interrupt arrives within it, the previous sample
/// is treated as released and an empty sample is produced, mirroring a panel
/// that only interrupts on contact.
pub struct ChannelTouchSource {
    rx: Receiver<Vec<Point>>,
    tick: Option<Duration>,
    last_was_contact: bool,
}

impl ChannelTouchSource {
    pub fn new(rx: Receiver<Vec<Point>>) -> Self {
        Self {
            rx,
            tick: None,
            last_was_contact: false,
        }
    }

    pub fn with_release_timeout(rx: Receiver<Vec<Point>>, tick: Duration) -> Self {
        Self {
            rx,
            tick: Some(tick),
            last_was_contact: false,
        }
    }
}

impl TouchSource for ChannelTouchSource {
    fn next_sample(&mut self) -> Result<Option<Vec<Point>>, TouchError> {
        let sample = match self.tick {
            Some(tick) if self.last_was_contact => match self.rx.recv_timeout(tick) {
                Ok(sample) => Some(sample),
                Err(RecvTimeoutError::Timeout) => Some(Vec::new()),
                Err(RecvTimeoutError::Disconnected) => None,
            },
            _ => self.rx.recv().ok(),
        };
        if let Some(s) = &sample {
            self.last_was_contact = !s.is_empty();
        }
        Ok(sample)
    }
}

/// Replays a fixed list of samples, then ends.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTouchSource {
    samples: VecDeque<Vec<Point>>,
    interval: Option<Duration>,
}

impl ScriptedTouchSource {
    pub fn new<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = Vec<Point>>,
    {
        Self {
            samples: samples.into_iter().collect(),
            interval: None,
        }
    }

    /// Sleeps `interval` before each sample, emulating the panel sample rate.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl TouchSource for ScriptedTouchSource {
    fn next_sample(&mut self) -> Result<Option<Vec<Point>>, TouchError> {
        if let Some(interval) = self.interval {
            if !self.samples.is_empty() {
                thread::sleep(interval);
            }
        }
        Ok(self.samples.pop_front())
    }
}

/// Starts the `touch-poller` thread.
///
/// The returned handle yields the number of samples processed once the source
/// ends.
pub fn spawn_poller<S>(
    mut source: S,
    mut dispatcher: TouchDispatcher,
) -> std::io::Result<thread::JoinHandle<u64>>
where
    S: TouchSource + 'static,
{
    thread::Builder::new()
        .name("touch-poller".into())
        .spawn(move || {
            let mut processed = 0u64;
            loop {
                match source.next_sample() {
                    Ok(Some(contacts)) => {
                        processed += 1;
                        dispatcher.dispatch(&contacts);
                    }
                    Ok(None) => {
                        log::debug!("touch source ended after {} samples", processed);
                        break;
                    }
                    Err(e) if e.is_fatal() => {
                        log::error!("touch poller stopping: {}", e);
                        break;
                    }
                    Err(e) => log::warn!("{}", e),
                }
            }
            processed
        })
}
