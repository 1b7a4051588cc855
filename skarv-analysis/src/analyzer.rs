//! The pipeline's transformation step: raw frame in, display-ready packet
//! out.

use skarv_capture::RawPacket;
use skarv_core::{ParsedPacket, Processor};

use crate::decode;

/// Stateless frame analyzer.
///
/// Safe to call concurrently from any number of worker threads on the
/// same instance.
#[derive(Clone, Copy, Debug, Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Processor for Analyzer {
    fn process(&self, raw: &RawPacket) -> ParsedPacket {
        let layers = decode::decode(&raw.data, raw.link_type);

        let mut src = String::new();
        let mut dst = String::new();
        let mut protocol = "Data";
        let mut info = String::new();

        for layer in &layers {
            // IP endpoints overwrite the MAC addresses from the link layer.
            if let Some(s) = &layer.src {
                src.clone_from(s);
            }
            if let Some(d) = &layer.dst {
                dst.clone_from(d);
            }
            // The label is the highest recognized layer; payload never
            // qualifies.
            if !layer.payload {
                protocol = layer.protocol;
            }
            if let Some(i) = &layer.info {
                info.clone_from(i);
            }
        }

        ParsedPacket {
            id: 0,
            timestamp: raw.timestamp,
            frame_len: raw.frame_len,
            data: raw.data.clone(),
            src,
            dst,
            protocol: protocol.to_string(),
            info,
            layers: layers.into_iter().map(|l| l.summary).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use bytes::Bytes;
    use skarv_capture::{Linktype, RawPacket};
    use skarv_core::Processor;

    use super::Analyzer;

    fn raw(data: Vec<u8>) -> RawPacket {
        RawPacket {
            timestamp: SystemTime::now(),
            frame_len: data.len(),
            data: Bytes::from(data),
            link_type: Linktype::ETHERNET,
        }
    }

    fn ethernet_header(ethertype: u16) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0x00, 0x00, 0x01]); // dst
        frame.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0x00, 0x00, 0x02]); // src
        frame.extend_from_slice(&ethertype.to_be_bytes());
        frame
    }

    fn ipv4_header(proto: u8, payload_len: u16) -> Vec<u8> {
        let total = 20 + payload_len;
        let mut h = vec![0x45, 0x00];
        h.extend_from_slice(&total.to_be_bytes());
        h.extend_from_slice(&[0x00, 0x00, 0x40, 0x00]); // id, flags
        h.push(64); // ttl
        h.push(proto);
        h.extend_from_slice(&[0x00, 0x00]); // checksum
        h.extend_from_slice(&[10, 0, 0, 1]);
        h.extend_from_slice(&[10, 0, 0, 2]);
        h
    }

    #[test]
    fn tcp_syn_frame() {
        let mut frame = ethernet_header(0x0800);
        frame.extend(ipv4_header(6, 20));
        // TCP: 12345 -> 80, SYN
        frame.extend_from_slice(&12345u16.to_be_bytes());
        frame.extend_from_slice(&80u16.to_be_bytes());
        frame.extend_from_slice(&[0; 8]); // seq, ack
        frame.extend_from_slice(&[0x50, 0x02, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00]);

        let parsed = Analyzer::new().process(&raw(frame));

        assert_eq!(parsed.protocol, "TCP");
        assert_eq!(parsed.src, "10.0.0.1");
        assert_eq!(parsed.dst, "10.0.0.2");
        assert_eq!(parsed.info, "12345 -> 80 [SYN]");
        assert_eq!(parsed.layers.len(), 3);
        assert!(parsed.layers[0].starts_with("Ethernet II"));
        assert!(parsed.layers[1].starts_with("IPv4"));
        assert!(parsed.layers[2].starts_with("TCP"));
    }

    #[test]
    fn udp_frame_with_payload() {
        let mut frame = ethernet_header(0x0800);
        frame.extend(ipv4_header(17, 12));
        frame.extend_from_slice(&53u16.to_be_bytes());
        frame.extend_from_slice(&49152u16.to_be_bytes());
        frame.extend_from_slice(&12u16.to_be_bytes());
        frame.extend_from_slice(&[0x00, 0x00]); // checksum
        frame.extend_from_slice(b"abcd");

        let parsed = Analyzer::new().process(&raw(frame));

        assert_eq!(parsed.protocol, "UDP");
        assert_eq!(parsed.info, "53 -> 49152");
        // Ethernet, IPv4, UDP, trailing data.
        assert_eq!(parsed.layers.len(), 4);
        assert_eq!(parsed.layers[3], "Data, 4 bytes");
    }

    #[test]
    fn arp_request_frame() {
        let mut frame = ethernet_header(0x0806);
        frame.extend_from_slice(&[0x00, 0x01, 0x08, 0x00, 6, 4, 0x00, 0x01]);
        frame.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0x00, 0x00, 0x02]); // sender mac
        frame.extend_from_slice(&[192, 168, 1, 1]); // sender ip
        frame.extend_from_slice(&[0; 6]); // target mac
        frame.extend_from_slice(&[192, 168, 1, 2]); // target ip

        let parsed = Analyzer::new().process(&raw(frame));

        assert_eq!(parsed.protocol, "ARP");
        assert_eq!(parsed.info, "Who has 192.168.1.2? Tell 192.168.1.1");
        // ARP carries no IP endpoint override; MACs stay.
        assert_eq!(parsed.src, "aa:bb:cc:00:00:02");
    }

    #[test]
    fn garbage_never_panics() {
        for len in 0..64 {
            let parsed = Analyzer::new().process(&raw(vec![0xFF; len]));
            assert!(!parsed.protocol.is_empty());
        }
    }

    #[test]
    fn icmp_echo_request() {
        let mut frame = ethernet_header(0x0800);
        frame.extend(ipv4_header(1, 8));
        frame.extend_from_slice(&[8, 0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01]);

        let parsed = Analyzer::new().process(&raw(frame));

        assert_eq!(parsed.protocol, "ICMP");
        assert_eq!(parsed.info, "Echo (ping) request");
    }
}
