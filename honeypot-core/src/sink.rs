use std::io::{self, Write};
use std::sync::Mutex;

use crate::event::EventRecord;

/// Write-only conduit that serializes [`EventRecord`]s as JSON lines.
///
/// Never consulted by business logic — no reads, no acknowledgements.
/// Per-field truncation happens at [`crate::event::EventDetail`]
/// construction time, so by the time a record reaches the sink it is
/// already within the sink's line-length expectations.
pub struct EventSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl EventSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        EventSink {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Serializes `record` and writes it as one line. Errors writing to the
    /// sink are logged via `tracing` and otherwise swallowed — a blocked or
    /// closed sink must never take down a session.
    pub fn emit(&self, record: &EventRecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(error) => {
                tracing::error!(%error, "failed to serialize event record");
                return;
            }
        };

        let mut writer = match self.writer.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(error) = writeln!(writer, "{line}") {
            tracing::error!(%error, "failed to write event to sink");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDetail;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn emits_one_json_line_per_record() {
        let buf = SharedBuf::default();
        let sink = EventSink::new(buf.clone());

        let rec = EventRecord::new(
            "10.0.0.7".into(),
            4444,
            "abc123".into(),
            EventDetail::ConnectionOpened,
        );
        sink.emit(&rec);

        let contents = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(contents.lines().count(), 1);
        let parsed: serde_json::Value = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(parsed["session_id"], "abc123");
        assert_eq!(parsed["event_type"], "connection_opened");
    }
}
