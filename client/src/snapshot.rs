//! Latest-wins slot shared between the receive path and the tick loop

use shared::Snapshot;
use std::sync::Arc;
use tokio::sync::watch;

/// Creates an empty cell, returning its only writer and only reader.
pub fn snapshot_cell() -> (SnapshotWriter, SnapshotReader) {
    let (tx, rx) = watch::channel(None);
    (SnapshotWriter { tx }, SnapshotReader { rx })
}

/// Write side, owned by the receive task.
#[derive(Debug)]
pub struct SnapshotWriter {
    tx: watch::Sender<Option<Arc<Snapshot>>>,
}

impl SnapshotWriter {
    /// Replaces the held snapshot in one step; older values are discarded.
    pub fn write(&self, snapshot: Snapshot) {
        self.tx.send_replace(Some(Arc::new(snapshot)));
    }

    /// Publishes the disconnect terminal state derived from the last snapshot.
    pub fn end_of_stream(&self) {
        let ended = {
            let current = self.tx.borrow();
            Snapshot::disconnected_from(current.as_deref())
        };
        self.write(ended);
    }
}

/// Read side, polled by the tick loop. Never blocks.
#[derive(Debug)]
pub struct SnapshotReader {
    rx: watch::Receiver<Option<Arc<Snapshot>>>,
}

impl SnapshotReader {
    pub fn read_latest(&self) -> Option<Arc<Snapshot>> {
        self.rx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(points: u32) -> Snapshot {
        Snapshot {
            scores: (points, points),
            ..Snapshot::default()
        }
    }

    #[test]
    fn test_empty_before_first_write() {
        let (_writer, reader) = snapshot_cell();
        assert!(reader.read_latest().is_none());
    }

    #[test]
    fn test_returns_last_of_n_writes() {
        let (writer, reader) = snapshot_cell();
        for points in 1..=5 {
            writer.write(scored(points));
        }
        assert_eq!(reader.read_latest().unwrap().scores, (5, 5));
        // Reading does not consume.
        assert_eq!(reader.read_latest().unwrap().scores, (5, 5));
    }

    #[test]
    fn test_end_of_stream_marks_disconnect() {
        let (writer, reader) = snapshot_cell();
        writer.write(scored(2));
        writer.end_of_stream();

        let latest = reader.read_latest().unwrap();
        assert!(latest.is_disconnect());
        assert_eq!(latest.scores, (2, 2));
    }

    #[test]
    fn test_reader_never_sees_torn_snapshot() {
        let (writer, reader) = snapshot_cell();

        let producer = std::thread::spawn(move || {
            for points in 0..20_000 {
                writer.write(scored(points));
            }
        });

        let mut last_seen = 0;
        while !producer.is_finished() {
            if let Some(snapshot) = reader.read_latest() {
                let (left, right) = snapshot.scores;
                assert_eq!(left, right);
                assert!(left >= last_seen);
                last_seen = left;
            }
        }
        producer.join().unwrap();
        assert_eq!(reader.read_latest().unwrap().scores, (19_999, 19_999));
    }
}
