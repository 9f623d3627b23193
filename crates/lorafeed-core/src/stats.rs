// ── Gateway counters ──

use std::sync::atomic::{AtomicU64, Ordering};

use strum::{EnumCount, IntoEnumIterator};

use crate::pipeline::Rejection;

/// Live counters shared between the ingest loop and forward tasks.
#[derive(Debug, Default)]
pub(crate) struct GatewayStats {
    frames_received: AtomicU64,
    rejected: [AtomicU64; Rejection::COUNT],
    batches_forwarded: AtomicU64,
    forwards_failed: AtomicU64,
    forwards_cancelled: AtomicU64,
    transmit_events: AtomicU64,
}

impl GatewayStats {
    pub(crate) fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_rejected(&self, reason: Rejection) {
        self.rejected[reason.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn batch_forwarded(&self) {
        self.batches_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn forward_failed(&self) {
        self.forwards_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn forward_cancelled(&self) {
        self.forwards_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn transmit_event(&self) {
        self.transmit_events.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        let mut rejected = [0; Rejection::COUNT];
        for reason in Rejection::iter() {
            rejected[reason.index()] = self.rejected[reason.index()].load(Ordering::Relaxed);
        }
        StatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            batches_forwarded: self.batches_forwarded.load(Ordering::Relaxed),
            forwards_failed: self.forwards_failed.load(Ordering::Relaxed),
            forwards_cancelled: self.forwards_cancelled.load(Ordering::Relaxed),
            transmit_events: self.transmit_events.load(Ordering::Relaxed),
            rejected,
        }
    }
}

/// Point-in-time copy of the gateway counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_received: u64,
    pub batches_forwarded: u64,
    pub forwards_failed: u64,
    /// Forwards abandoned because the gateway shut down.
    pub forwards_cancelled: u64,
    pub transmit_events: u64,
    rejected: [u64; Rejection::COUNT],
}

impl StatsSnapshot {
    /// Frames dropped for `reason`.
    pub fn rejected(&self, reason: Rejection) -> u64 {
        self.rejected[reason.index()]
    }

    pub fn total_rejected(&self) -> u64 {
        self.rejected.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_tracks_rejections_per_reason() {
        let stats = GatewayStats::default();
        stats.frame_received();
        stats.frame_received();
        stats.frame_rejected(Rejection::PayloadTooShort);
        stats.frame_rejected(Rejection::PayloadTooShort);
        stats.frame_rejected(Rejection::MalformedReading);

        let snap = stats.snapshot();
        assert_eq!(snap.frames_received, 2);
        assert_eq!(snap.rejected(Rejection::PayloadTooShort), 2);
        assert_eq!(snap.rejected(Rejection::MalformedReading), 1);
        assert_eq!(snap.rejected(Rejection::NoReadings), 0);
        assert_eq!(snap.total_rejected(), 3);
    }
}
