//! Routing of capture events to the active consumer.
//!
//! A [`RoutingContext`] is created once at startup and shared by reference
//! with every session. It holds at most one [`EventSink`]; events delivered
//! while no sink is bound are dropped.

use std::sync::{Arc, RwLock};

use log::{debug, warn};

use crate::capture::event::CaptureEvent;

/// Delivery surface for capture events.
///
/// Implementations decide what happens beyond this boundary (an event bus,
/// a log, a test recorder). `emit` is called from capture worker threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, channel: &str, event: &CaptureEvent);
}

/// Binding between capture workers and the current consumer.
#[derive(Default)]
pub struct RoutingContext {
    sink: RwLock<Option<Arc<dyn EventSink>>>,
}

impl RoutingContext {
    /// Creates an unbound context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context already bound to `sink`.
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink: RwLock::new(Some(sink)),
        }
    }

    /// Sets the delivery target, replacing any previous one.
    pub fn bind(&self, sink: Arc<dyn EventSink>) {
        let mut slot = match self.sink.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.replace(sink).is_some() {
            debug!("Replaced bound event sink");
        }
    }

    /// Removes the delivery target. Later events are dropped.
    pub fn unbind(&self) {
        let mut slot = match self.sink.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.take();
    }

    /// Returns whether a sink is currently bound.
    pub fn is_bound(&self) -> bool {
        self.current().is_some()
    }

    /// Forwards `event` to the bound sink.
    ///
    /// Returns `false` when nothing is bound and the event was dropped.
    /// Delivery is at-most-once; dropped events are never replayed.
    pub fn deliver(&self, event: &CaptureEvent) -> bool {
        match self.current() {
            Some(sink) => {
                sink.emit(event.channel(), event);
                true
            }
            None => false,
        }
    }

    // The sink is cloned out so `emit` runs without holding the lock and a
    // rebind never waits on a slow consumer.
    fn current(&self) -> Option<Arc<dyn EventSink>> {
        match self.sink.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                warn!("Event sink lock poisoned, recovering binding");
                poisoned.into_inner().clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::event::BeaconEvent;
    use crate::capture::sink::RecordingSink;
    use std::thread;

    fn beacon(ssid: &str) -> CaptureEvent {
        CaptureEvent::Beacon(BeaconEvent {
            ssid: ssid.to_string(),
            bssid: "00:11:22:33:44:55".to_string(),
            channel: 1,
            frequency: 2412,
            signal_strength: -60,
        })
    }

    #[test]
    fn test_deliver_unbound_drops() {
        let routing = RoutingContext::new();
        assert!(!routing.is_bound());
        assert!(!routing.deliver(&beacon("lost")));

        let sink = Arc::new(RecordingSink::new());
        routing.bind(sink.clone());
        assert!(sink.events().is_empty());

        assert!(routing.deliver(&beacon("seen")));
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1, beacon("seen"));
    }

    #[test]
    fn test_rebind_replaces_sink() {
        let first = Arc::new(RecordingSink::new());
        let second = Arc::new(RecordingSink::new());
        let routing = RoutingContext::with_sink(first.clone());

        routing.deliver(&beacon("one"));
        routing.bind(second.clone());
        routing.deliver(&beacon("two"));

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(second.events()[0].0, "network:found");
    }

    #[test]
    fn test_unbind_drops_later_events() {
        let sink = Arc::new(RecordingSink::new());
        let routing = RoutingContext::with_sink(sink.clone());
        routing.unbind();

        assert!(!routing.deliver(&beacon("gone")));
        assert_eq!(sink.len(), 0);
    }

    #[test]
    fn test_concurrent_delivery() {
        let sink = Arc::new(RecordingSink::new());
        let routing = Arc::new(RoutingContext::with_sink(sink.clone()));

        let workers: Vec<_> = (0..4)
            .map(|i| {
                let routing = Arc::clone(&routing);
                thread::spawn(move || {
                    for n in 0..100 {
                        routing.deliver(&beacon(&format!("{}-{}", i, n)));
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(sink.len(), 400);
    }
}
