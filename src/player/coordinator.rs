//! # Coordinator Loop
//!
//! Plays user selections one after another. Between sessions it blocks on the
//! controller's completion signal, so the next selection never starts before
//! the previous stream has fully drained.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};
use serde::Serialize;

use crate::engine::MediaEngine;
use crate::error::{PlayerError, classify};
use crate::player::controller::PlaybackController;

/// Result of polling a [`SelectionSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Play this file next.
    Ready(PathBuf),
    /// Nothing chosen yet; poll again later.
    Pending,
    /// No more selections will come.
    Exhausted,
}

/// Where the coordinator gets files to play (a file browser, a queue).
pub trait SelectionSource: Send {
    fn next_selection(&mut self) -> Selection;
}

/// A fixed list of files, played in order.
#[derive(Debug, Clone, Default)]
pub struct QueuedSelections {
    queue: VecDeque<PathBuf>,
}

impl QueuedSelections {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            queue: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl SelectionSource for QueuedSelections {
    fn next_selection(&mut self) -> Selection {
        self.queue
            .pop_front()
            .map_or(Selection::Exhausted, Selection::Ready)
    }
}

/// Selections pushed from another thread; exhausted once every sender is gone.
pub struct ChannelSelections {
    rx: Receiver<PathBuf>,
}

impl ChannelSelections {
    pub fn new(rx: Receiver<PathBuf>) -> Self {
        Self { rx }
    }
}

impl SelectionSource for ChannelSelections {
    fn next_selection(&mut self) -> Selection {
        match self.rx.try_recv() {
            Ok(path) => Selection::Ready(path),
            Err(TryRecvError::Empty) => Selection::Pending,
            Err(TryRecvError::Disconnected) => Selection::Exhausted,
        }
    }
}

/// Outcome of a coordinator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorReport {
    /// Selections that started and ran to end-of-stream.
    pub played: usize,
    /// Selections the engine refused.
    pub failed: usize,
}

pub struct Coordinator<E> {
    controller: Arc<PlaybackController<E>>,
    poll: Duration,
}

impl<E: MediaEngine> Coordinator<E> {
    pub fn new(controller: Arc<PlaybackController<E>>, poll: Duration) -> Self {
        Self { controller, poll }
    }

    /// Runs until the source is exhausted or a fatal error occurs.
    pub fn run<S: SelectionSource + ?Sized>(&self, source: &mut S) -> CoordinatorReport {
        let mut report = CoordinatorReport::default();
        let completion = self.controller.completion();
        loop {
            let path = match source.next_selection() {
                Selection::Ready(path) => path,
                Selection::Pending => {
                    thread::sleep(self.poll);
                    continue;
                }
                Selection::Exhausted => break,
            };

            match self.controller.play(&path) {
                Ok(()) => {
                    completion.take();
                    report.played += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    e.log();
                    if classify::is_fatal(&e) {
                        break;
                    }
                    if !matches!(e, PlayerError::EngineIo { .. }) {
                        log::warn!("continuing with next selection after {}", e.category());
                    }
                }
            }
        }
        log::info!(
            "coordinator finished: {} played, {} failed",
            report.played,
            report.failed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineEvents;
    use crate::error::PlayerResult;
    use std::path::Path;

    /// Ends every stream immediately from a helper thread.
    struct InstantEngine;

    impl MediaEngine for InstantEngine {
        fn play(&mut self, path: &Path, events: Arc<dyn EngineEvents>) -> PlayerResult<()> {
            if path.extension().is_some_and(|e| e == "bad") {
                return Err(PlayerError::engine_io(path, "unreadable"));
            }
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(5));
                events.on_end_of_stream();
            });
            Ok(())
        }

        fn stop(&mut self) -> PlayerResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_queue_plays_in_order_and_skips_failures() {
        let controller = Arc::new(PlaybackController::new(InstantEngine));
        let coordinator = Coordinator::new(controller.clone(), Duration::from_millis(1));
        let mut source = QueuedSelections::new(["a.avi", "b.bad", "c.avi"]);

        let report = coordinator.run(&mut source);
        assert_eq!(report, CoordinatorReport { played: 2, failed: 1 });
        assert!(source.is_empty());
    }

    #[test]
    fn test_channel_source_pending_then_exhausted() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut source = ChannelSelections::new(rx);
        assert_eq!(source.next_selection(), Selection::Pending);
        tx.send(PathBuf::from("x.avi")).unwrap();
        assert_eq!(source.next_selection(), Selection::Ready("x.avi".into()));
        drop(tx);
        assert_eq!(source.next_selection(), Selection::Exhausted);
    }

    #[test]
    fn test_channel_selections_drive_coordinator() {
        let controller = Arc::new(PlaybackController::new(InstantEngine));
        let coordinator = Coordinator::new(controller, Duration::from_millis(1));
        let (tx, rx) = crossbeam_channel::unbounded();

        let feeder = thread::spawn(move || {
            for name in ["one.avi", "two.avi"] {
                thread::sleep(Duration::from_millis(10));
                tx.send(PathBuf::from(name)).unwrap();
            }
        });

        let report = coordinator.run(&mut ChannelSelections::new(rx));
        feeder.join().unwrap();
        assert_eq!(report.played, 2);
    }
}
