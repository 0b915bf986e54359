#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic scheduler that turns frame callbacks into simulation ticks.

use monster_defence_core::Command;

/// Pure system that emits one tick command per rendered frame.
#[derive(Debug, Default)]
pub struct TickScheduler {
    last_frame: Option<u64>,
    ticks_issued: u64,
}

impl TickScheduler {
    /// Creates a scheduler that has not observed any frame yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_frame: None,
            ticks_issued: 0,
        }
    }

    /// Reacts to the frame callback for `frame` by emitting a tick.
    ///
    /// Frames are expected in increasing order. A frame index that was
    /// already seen, or one older than the last frame, produces nothing.
    pub fn handle(&mut self, frame: u64, out: &mut Vec<Command>) {
        if self.last_frame.is_some_and(|last| frame <= last) {
            tracing::trace!(frame, last = ?self.last_frame, "stale frame ignored");
            return;
        }

        self.last_frame = Some(frame);
        self.ticks_issued += 1;
        out.push(Command::Tick);
    }

    /// Number of tick commands emitted so far.
    #[must_use]
    pub const fn ticks_issued(&self) -> u64 {
        self.ticks_issued
    }

    /// Most recent frame that produced a tick.
    #[must_use]
    pub const fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }
}
