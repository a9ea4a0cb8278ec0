use std::sync::{Arc, PoisonError, RwLock};

use dimlink_telemetry::TelemetrySnapshot;

use crate::session::SessionEvent;

/// Latest decoded snapshot plus a liveness flag.
///
/// `receiving` is true only while the most recent outcome was a good
/// snapshot. Any rejected frame or buffer reset clears it but keeps the last
/// snapshot around for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotSink {
    latest: Option<TelemetrySnapshot>,
    receiving: bool,
    generation: u64,
}

impl SnapshotSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one session event in stream order.
    pub fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Snapshot(snapshot) => self.record_snapshot(*snapshot),
            SessionEvent::Warning(_) => self.record_invalid(),
        }
    }

    pub fn record_snapshot(&mut self, snapshot: TelemetrySnapshot) {
        self.latest = Some(snapshot);
        self.receiving = true;
        self.generation += 1;
    }

    pub fn record_invalid(&mut self) {
        self.receiving = false;
        self.generation += 1;
    }

    /// Stream closed: back to the initial state.
    pub fn close(&mut self) {
        self.latest = None;
        self.receiving = false;
        self.generation += 1;
    }

    pub fn latest(&self) -> Option<&TelemetrySnapshot> {
        self.latest.as_ref()
    }

    pub fn is_receiving(&self) -> bool {
        self.receiving
    }

    /// Bumped on every change; lets readers skip redraws.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A copy of the sink state at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SinkView {
    pub latest: Option<TelemetrySnapshot>,
    pub receiving: bool,
    pub generation: u64,
}

/// Cloneable handle to a session's sink.
///
/// The session writes; every other holder reads through [`SharedSink::view`].
#[derive(Debug, Clone, Default)]
pub struct SharedSink {
    inner: Arc<RwLock<SnapshotSink>>,
}

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn view(&self) -> SinkView {
        let sink = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        SinkView {
            latest: sink.latest,
            receiving: sink.receiving,
            generation: sink.generation,
        }
    }

    pub fn latest(&self) -> Option<TelemetrySnapshot> {
        self.view().latest
    }

    pub fn is_receiving(&self) -> bool {
        self.view().receiving
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut SnapshotSink)) {
        let mut sink = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut sink);
    }
}

#[cfg(test)]
mod tests {
    use dimlink_frame::DecodeWarning;

    use super::*;
    use crate::session::SessionWarning;

    fn snapshot(loop_state: i16) -> TelemetrySnapshot {
        let mut snapshot = TelemetrySnapshot::default();
        snapshot.device.loop_state = loop_state;
        snapshot
    }

    fn warning(w: DecodeWarning) -> SessionEvent {
        SessionEvent::Warning(SessionWarning::Frame(w))
    }

    #[test]
    fn starts_empty() {
        let sink = SnapshotSink::new();
        assert!(sink.latest().is_none());
        assert!(!sink.is_receiving());
        assert_eq!(sink.generation(), 0);
    }

    #[test]
    fn snapshot_sets_latest_and_receiving() {
        let mut sink = SnapshotSink::new();
        sink.apply(&SessionEvent::Snapshot(snapshot(100)));
        assert_eq!(sink.latest().map(|s| s.device.loop_state), Some(100));
        assert!(sink.is_receiving());

        sink.apply(&SessionEvent::Snapshot(snapshot(200)));
        assert_eq!(sink.latest().map(|s| s.device.loop_state), Some(200));
        assert_eq!(sink.generation(), 2);
    }

    #[test]
    fn every_warning_clears_receiving_but_keeps_latest() {
        let warnings = [
            DecodeWarning::UnexpectedSource { id: 4 },
            DecodeWarning::LengthMismatch {
                expected: 55,
                actual: 12,
            },
            DecodeWarning::BufferOverflow {
                buffered: 180,
                limit: 180,
            },
        ];
        for w in warnings {
            let mut sink = SnapshotSink::new();
            sink.apply(&SessionEvent::Snapshot(snapshot(100)));
            sink.apply(&warning(w));
            assert!(!sink.is_receiving(), "{w} should clear receiving");
            assert_eq!(sink.latest().map(|s| s.device.loop_state), Some(100));
        }
    }

    #[test]
    fn recovers_after_warning() {
        let mut sink = SnapshotSink::new();
        sink.apply(&warning(DecodeWarning::UnexpectedSource { id: 1 }));
        sink.apply(&SessionEvent::Snapshot(snapshot(50)));
        assert!(sink.is_receiving());
    }

    #[test]
    fn close_resets_state() {
        let mut sink = SnapshotSink::new();
        sink.apply(&SessionEvent::Snapshot(snapshot(100)));
        sink.close();
        assert!(sink.latest().is_none());
        assert!(!sink.is_receiving());
    }

    #[test]
    fn shared_view_follows_updates() {
        let shared = SharedSink::new();
        let reader = shared.clone();
        assert_eq!(reader.view(), SinkView::default());

        shared.update(|sink| sink.record_snapshot(snapshot(1100)));
        let view = reader.view();
        assert!(view.receiving);
        assert_eq!(view.latest.map(|s| s.device.loop_state), Some(1100));
        assert_eq!(view.generation, 1);

        shared.update(SnapshotSink::close);
        assert!(reader.latest().is_none());
        assert!(!reader.is_receiving());
    }
}
