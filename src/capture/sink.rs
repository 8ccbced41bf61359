//! Concrete event sinks.

use std::io::Write;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use log::{info, warn};
use serde::Serialize;

use crate::capture::event::CaptureEvent;
use crate::capture::routing::EventSink;

/// Writes a one-line summary of every event to the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    /// The line logged for `event` on `channel`.
    pub fn summary(channel: &str, event: &CaptureEvent) -> String {
        match event {
            CaptureEvent::Beacon(b) => format!(
                "{}: SSID={} BSSID={} Ch={} Freq={} MHz Signal={} dBm",
                channel, b.ssid, b.bssid, b.channel, b.frequency, b.signal_strength
            ),
            CaptureEvent::Packet(p) => format!(
                "{}: {} -> {} [{}] {} bytes",
                channel,
                p.src_mac,
                p.dest_mac,
                p.eth_type,
                p.payload.len()
            ),
        }
    }
}

impl EventSink for LogSink {
    fn emit(&self, channel: &str, event: &CaptureEvent) {
        info!("{}", Self::summary(channel, event));
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    channel: &'a str,
    event: &'a CaptureEvent,
}

/// Streams events as JSON lines (`{"channel": ..., "event": {...}}`).
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the sink and returns the underlying writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn emit(&self, channel: &str, event: &CaptureEvent) {
        let line = match serde_json::to_string(&Envelope { channel, event }) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize {} event: {}", channel, e);
                return;
            }
        };

        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!("Failed to write {} event: {}", channel, e);
        }
    }
}

/// Keeps every event in arrival order.
///
/// Useful for embedding and for tests that need to wait until a worker
/// thread has delivered a given number of events.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, CaptureEvent)>>,
    arrived: Condvar,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded `(channel, event)` pairs.
    pub fn events(&self) -> Vec<(String, CaptureEvent)> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.events.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Blocks until at least `count` events were recorded or `timeout`
    /// elapses. Returns whether the count was reached.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut events = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        while events.len() < count {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            events = match self.arrived.wait_timeout(events, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, channel: &str, event: &CaptureEvent) {
        let mut events = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push((channel.to_string(), event.clone()));
        self.arrived.notify_all();
    }
}
