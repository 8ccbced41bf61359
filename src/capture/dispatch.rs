//! Conversion of native callback arguments into routed events.

use std::os::raw::{c_char, c_int};
use std::sync::Arc;

use log::{debug, warn};

use crate::capture::event::{BeaconEvent, CaptureEvent, PacketEvent};
use crate::capture::marshal::{decode_bytes, decode_text, MarshalError};
use crate::capture::routing::RoutingContext;
use crate::capture::session::{CaptureKind, SessionStats};

/// Raw arguments of one packet callback.
#[derive(Debug, Clone, Copy)]
pub struct RawPacketRecord {
    pub src_mac: *const c_char,
    pub dest_mac: *const c_char,
    pub eth_type: *const c_char,
    pub src_ipv4: *const c_char,
    pub dest_ipv4: *const c_char,
    pub src_ipv6: *const c_char,
    pub dest_ipv6: *const c_char,
    pub src_port: c_int,
    pub dest_port: c_int,
    pub payload: *const u8,
    pub payload_length: c_int,
}

/// Turns each native record of one session into an event and routes it.
///
/// Records are handled synchronously on the thread the engine calls back
/// on, so events reach the sink in the order the engine issued them. A
/// record that fails to decode is skipped and the session carries on.
pub struct RecordDispatcher {
    kind: CaptureKind,
    routing: Arc<RoutingContext>,
    stats: Arc<SessionStats>,
}

impl RecordDispatcher {
    pub fn new(kind: CaptureKind, routing: Arc<RoutingContext>, stats: Arc<SessionStats>) -> Self {
        Self {
            kind,
            routing,
            stats,
        }
    }

    /// Handles one beacon callback.
    ///
    /// # Safety
    ///
    /// `ssid` and `bssid` must satisfy [`decode_text`]'s contract.
    pub unsafe fn beacon_record(
        &self,
        ssid: *const c_char,
        bssid: *const c_char,
        channel: c_int,
        frequency: c_int,
        signal_strength: c_int,
    ) {
        let decoded = decode_beacon(ssid, bssid, channel, frequency, signal_strength);
        self.relay(decoded.map(CaptureEvent::from));
    }

    /// Handles one packet callback.
    ///
    /// # Safety
    ///
    /// Every string field must satisfy [`decode_text`]'s contract and the
    /// payload must satisfy [`decode_bytes`]'s.
    pub unsafe fn packet_record(&self, record: RawPacketRecord) {
        let decoded = decode_packet(&record);
        self.relay(decoded.map(CaptureEvent::from));
    }

    fn relay(&self, decoded: Result<CaptureEvent, MarshalError>) {
        match decoded {
            Ok(event) => {
                if self.routing.deliver(&event) {
                    self.stats.record_delivered();
                } else {
                    debug!("No consumer bound, dropped {} event", self.kind);
                    self.stats.record_dropped();
                }
            }
            Err(e) => {
                warn!("Skipping {} record: {}", self.kind, e);
                self.stats.record_skipped();
            }
        }
    }
}

unsafe fn decode_beacon(
    ssid: *const c_char,
    bssid: *const c_char,
    channel: c_int,
    frequency: c_int,
    signal_strength: c_int,
) -> Result<BeaconEvent, MarshalError> {
    Ok(BeaconEvent {
        ssid: decode_text(ssid)?,
        bssid: decode_text(bssid)?,
        channel,
        frequency,
        signal_strength,
    })
}

unsafe fn decode_packet(record: &RawPacketRecord) -> Result<PacketEvent, MarshalError> {
    Ok(PacketEvent {
        src_mac: decode_text(record.src_mac)?,
        dest_mac: decode_text(record.dest_mac)?,
        eth_type: decode_text(record.eth_type)?,
        src_ipv4: decode_text(record.src_ipv4)?,
        dest_ipv4: decode_text(record.dest_ipv4)?,
        src_ipv6: decode_text(record.src_ipv6)?,
        dest_ipv6: decode_text(record.dest_ipv6)?,
        src_port: record.src_port,
        dest_port: record.dest_port,
        payload: decode_bytes(record.payload, record.payload_length)?,
    })
}
