//! Structured events relayed to the consumer.

use base64::prelude::*;
use serde::{Serialize, Serializer};

/// Channel carrying one [`BeaconEvent`] per beacon frame.
pub const NETWORK_FOUND: &str = "network:found";
/// Channel carrying one [`PacketEvent`] per captured packet.
pub const PACKET_CAPTURED: &str = "packet:captured";

/// A wireless network advertised by a beacon frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconEvent {
    pub ssid: String,
    pub bssid: String,
    pub channel: i32,
    /// Channel frequency in MHz
    pub frequency: i32,
    /// Signal strength in dBm
    pub signal_strength: i32,
}

/// A captured frame with its link, network and transport addressing.
///
/// Address fields the engine could not fill are empty strings; ports are
/// zero for non-TCP traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketEvent {
    pub src_mac: String,
    pub dest_mac: String,
    pub eth_type: String,
    #[serde(rename = "srcIPv4")]
    pub src_ipv4: String,
    #[serde(rename = "destIPv4")]
    pub dest_ipv4: String,
    #[serde(rename = "srcIPv6")]
    pub src_ipv6: String,
    #[serde(rename = "destIPv6")]
    pub dest_ipv6: String,
    pub src_port: i32,
    pub dest_port: i32,
    /// Transport payload, exactly as many bytes as the engine reported.
    #[serde(serialize_with = "serialize_payload")]
    pub payload: Vec<u8>,
}

/// Any event produced by a capture session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CaptureEvent {
    Beacon(BeaconEvent),
    Packet(PacketEvent),
}

impl CaptureEvent {
    /// Returns the consumer-facing channel name for this event.
    pub fn channel(&self) -> &'static str {
        match self {
            CaptureEvent::Beacon(_) => NETWORK_FOUND,
            CaptureEvent::Packet(_) => PACKET_CAPTURED,
        }
    }
}

impl From<BeaconEvent> for CaptureEvent {
    fn from(event: BeaconEvent) -> Self {
        CaptureEvent::Beacon(event)
    }
}

impl From<PacketEvent> for CaptureEvent {
    fn from(event: PacketEvent) -> Self {
        CaptureEvent::Packet(event)
    }
}

fn serialize_payload<S>(payload: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&BASE64_STANDARD.encode(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_packet(payload: Vec<u8>) -> PacketEvent {
        PacketEvent {
            src_mac: "aa:bb:cc:dd:ee:ff".to_string(),
            dest_mac: "11:22:33:44:55:66".to_string(),
            eth_type: "IPv4 TCP".to_string(),
            src_ipv4: "10.0.0.1".to_string(),
            dest_ipv4: "10.0.0.2".to_string(),
            src_ipv6: String::new(),
            dest_ipv6: String::new(),
            src_port: 443,
            dest_port: 51234,
            payload,
        }
    }

    #[test]
    fn test_channel_names() {
        let beacon = CaptureEvent::from(BeaconEvent {
            ssid: "A".to_string(),
            bssid: "00:11:22:33:44:55".to_string(),
            channel: 6,
            frequency: 2437,
            signal_strength: -40,
        });
        assert_eq!(beacon.channel(), "network:found");

        let packet = CaptureEvent::from(sample_packet(Vec::new()));
        assert_eq!(packet.channel(), "packet:captured");
    }

    #[test]
    fn test_beacon_serialization() {
        let event = CaptureEvent::Beacon(BeaconEvent {
            ssid: "A".to_string(),
            bssid: "00:11:22:33:44:55".to_string(),
            channel: 6,
            frequency: 2437,
            signal_strength: -40,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "ssid": "A",
                "bssid": "00:11:22:33:44:55",
                "channel": 6,
                "frequency": 2437,
                "signalStrength": -40,
            })
        );
    }

    #[test]
    fn test_packet_serialization_keys() {
        let value = serde_json::to_value(sample_packet(Vec::new())).unwrap();
        let object = value.as_object().unwrap();
        for key in [
            "srcMac", "destMac", "ethType", "srcIPv4", "destIPv4", "srcIPv6", "destIPv6",
            "srcPort", "destPort", "payload",
        ] {
            assert!(object.contains_key(key), "missing key {}", key);
        }
        assert_eq!(object["payload"], "");
    }

    #[test]
    fn test_payload_serializes_every_byte() {
        let value = serde_json::to_value(sample_packet(vec![0, 1, 2, 0, 255])).unwrap();
        let encoded = value["payload"].as_str().unwrap();
        assert_eq!(encoded, "AAECAP8=");
        assert_eq!(
            BASE64_STANDARD.decode(encoded).unwrap(),
            vec![0, 1, 2, 0, 255]
        );
    }
}
