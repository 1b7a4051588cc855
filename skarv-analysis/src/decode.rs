//! Fixed-offset header decoding for the common link/network/transport
//! protocols. Every reader is bounds-checked; anything truncated or
//! unrecognized becomes a generic data layer.

use std::net::{Ipv4Addr, Ipv6Addr};

use skarv_capture::Linktype;

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_ARP: u16 = 0x0806;
const ETHERTYPE_IPV6: u16 = 0x86DD;

const IPPROTO_ICMP: u8 = 1;
const IPPROTO_TCP: u8 = 6;
const IPPROTO_UDP: u8 = 17;
const IPPROTO_ICMPV6: u8 = 58;

/// One decoded protocol layer.
#[derive(Clone, Debug)]
pub struct Layer {
    /// Protocol name; `"Data"` for unrecognized bytes.
    pub protocol: &'static str,

    /// Human-readable one-liner for the detail view.
    pub summary: String,

    /// Endpoint override carried by this layer (MAC at the link layer,
    /// IP at the network layer).
    pub src: Option<String>,
    pub dst: Option<String>,

    /// Candidate for the packet's info column.
    pub info: Option<String>,

    /// Payload layers never become the packet's protocol label.
    pub payload: bool,
}

impl Layer {
    fn data(len: usize) -> Self {
        Self {
            protocol: "Data",
            summary: format!("Data, {len} bytes"),
            src: None,
            dst: None,
            info: None,
            payload: true,
        }
    }
}

/// Decodes the layer chain of one captured frame, link layer first.
pub fn decode(data: &[u8], link_type: Linktype) -> Vec<Layer> {
    let mut layers = Vec::new();
    if link_type == Linktype::ETHERNET {
        ethernet(data, &mut layers);
    } else {
        layers.push(Layer::data(data.len()));
    }
    layers
}

fn ethernet(data: &[u8], layers: &mut Vec<Layer>) {
    if data.len() < 14 {
        layers.push(Layer::data(data.len()));
        return;
    }

    let dst = mac(&data[0..6]);
    let src = mac(&data[6..12]);
    let ethertype = u16::from_be_bytes([data[12], data[13]]);

    layers.push(Layer {
        protocol: "Ethernet",
        summary: format!("Ethernet II, Src: {src}, Dst: {dst}"),
        src: Some(src),
        dst: Some(dst),
        info: None,
        payload: false,
    });

    let rest = &data[14..];
    match ethertype {
        ETHERTYPE_IPV4 => ipv4(rest, layers),
        ETHERTYPE_IPV6 => ipv6(rest, layers),
        ETHERTYPE_ARP => arp(rest, layers),
        _ => {
            if !rest.is_empty() {
                layers.push(Layer::data(rest.len()));
            }
        }
    }
}

fn ipv4(data: &[u8], layers: &mut Vec<Layer>) {
    if data.len() < 20 || data[0] >> 4 != 4 {
        layers.push(Layer::data(data.len()));
        return;
    }
    let header_len = usize::from(data[0] & 0x0F) * 4;
    if header_len < 20 || header_len > data.len() {
        layers.push(Layer::data(data.len()));
        return;
    }

    let ttl = data[8];
    let proto = data[9];
    let src = Ipv4Addr::new(data[12], data[13], data[14], data[15]);
    let dst = Ipv4Addr::new(data[16], data[17], data[18], data[19]);

    layers.push(Layer {
        protocol: "IPv4",
        summary: format!("IPv4, Src: {src}, Dst: {dst}, TTL: {ttl}"),
        src: Some(src.to_string()),
        dst: Some(dst.to_string()),
        info: None,
        payload: false,
    });

    transport(proto, &data[header_len..], layers);
}

fn ipv6(data: &[u8], layers: &mut Vec<Layer>) {
    if data.len() < 40 || data[0] >> 4 != 6 {
        layers.push(Layer::data(data.len()));
        return;
    }

    let next_header = data[6];
    let hop_limit = data[7];
    let mut src_bytes = [0u8; 16];
    src_bytes.copy_from_slice(&data[8..24]);
    let mut dst_bytes = [0u8; 16];
    dst_bytes.copy_from_slice(&data[24..40]);
    let src = Ipv6Addr::from(src_bytes);
    let dst = Ipv6Addr::from(dst_bytes);

    layers.push(Layer {
        protocol: "IPv6",
        summary: format!("IPv6, Src: {src}, Dst: {dst}, Hop limit: {hop_limit}"),
        src: Some(src.to_string()),
        dst: Some(dst.to_string()),
        info: None,
        payload: false,
    });

    // Extension headers are not walked; anything beyond the fixed header
    // that is not a known transport shows up as data.
    transport(next_header, &data[40..], layers);
}

fn transport(proto: u8, data: &[u8], layers: &mut Vec<Layer>) {
    match proto {
        IPPROTO_TCP => tcp(data, layers),
        IPPROTO_UDP => udp(data, layers),
        IPPROTO_ICMP => icmp(data, layers, false),
        IPPROTO_ICMPV6 => icmp(data, layers, true),
        _ => {
            if !data.is_empty() {
                layers.push(Layer::data(data.len()));
            }
        }
    }
}

fn tcp(data: &[u8], layers: &mut Vec<Layer>) {
    if data.len() < 20 {
        layers.push(Layer::data(data.len()));
        return;
    }

    let sport = u16::from_be_bytes([data[0], data[1]]);
    let dport = u16::from_be_bytes([data[2], data[3]]);
    let seq = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    let header_len = usize::from(data[12] >> 4) * 4;
    let flags = tcp_flags(data[13]);

    layers.push(Layer {
        protocol: "TCP",
        summary: format!("TCP, {sport} -> {dport} [{flags}], Seq: {seq}"),
        src: None,
        dst: None,
        info: Some(format!("{sport} -> {dport} [{flags}]")),
        payload: false,
    });

    if header_len >= 20 && header_len < data.len() {
        layers.push(Layer::data(data.len() - header_len));
    }
}

fn tcp_flags(bits: u8) -> String {
    const NAMES: [(u8, &str); 6] = [
        (0x01, "FIN"),
        (0x02, "SYN"),
        (0x04, "RST"),
        (0x08, "PSH"),
        (0x10, "ACK"),
        (0x20, "URG"),
    ];
    let set: Vec<&str> = NAMES
        .iter()
        .filter(|(bit, _)| bits & bit != 0)
        .map(|(_, name)| *name)
        .collect();
    set.join(", ")
}

fn udp(data: &[u8], layers: &mut Vec<Layer>) {
    if data.len() < 8 {
        layers.push(Layer::data(data.len()));
        return;
    }

    let sport = u16::from_be_bytes([data[0], data[1]]);
    let dport = u16::from_be_bytes([data[2], data[3]]);
    let length = u16::from_be_bytes([data[4], data[5]]);

    layers.push(Layer {
        protocol: "UDP",
        summary: format!("UDP, {sport} -> {dport}, Len: {length}"),
        src: None,
        dst: None,
        info: Some(format!("{sport} -> {dport}")),
        payload: false,
    });

    if data.len() > 8 {
        layers.push(Layer::data(data.len() - 8));
    }
}

fn icmp(data: &[u8], layers: &mut Vec<Layer>, v6: bool) {
    if data.len() < 4 {
        layers.push(Layer::data(data.len()));
        return;
    }

    let kind = data[0];
    let describe = if v6 { icmpv6_type } else { icmp_type };
    let text = describe(kind);
    let protocol = if v6 { "ICMPv6" } else { "ICMP" };

    layers.push(Layer {
        protocol,
        summary: format!("{protocol}, {text}"),
        src: None,
        dst: None,
        info: Some(text),
        payload: false,
    });
}

fn icmp_type(kind: u8) -> String {
    match kind {
        0 => "Echo (ping) reply".into(),
        3 => "Destination unreachable".into(),
        8 => "Echo (ping) request".into(),
        11 => "Time-to-live exceeded".into(),
        other => format!("Type {other}"),
    }
}

fn icmpv6_type(kind: u8) -> String {
    match kind {
        128 => "Echo (ping) request".into(),
        129 => "Echo (ping) reply".into(),
        135 => "Neighbor solicitation".into(),
        136 => "Neighbor advertisement".into(),
        other => format!("Type {other}"),
    }
}

fn arp(data: &[u8], layers: &mut Vec<Layer>) {
    if data.len() < 28 {
        layers.push(Layer::data(data.len()));
        return;
    }

    let oper = u16::from_be_bytes([data[6], data[7]]);
    let sender = Ipv4Addr::new(data[14], data[15], data[16], data[17]);
    let target = Ipv4Addr::new(data[24], data[25], data[26], data[27]);

    let info = match oper {
        1 => format!("Who has {target}? Tell {sender}"),
        2 => format!("{sender} is at {}", mac(&data[8..14])),
        other => format!("Operation {other}"),
    };

    layers.push(Layer {
        protocol: "ARP",
        summary: format!("ARP, {info}"),
        src: None,
        dst: None,
        info: Some(info),
        payload: false,
    });
}

fn mac(bytes: &[u8]) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]
    )
}

#[cfg(test)]
mod tests {
    use skarv_capture::Linktype;

    use super::decode;

    #[test]
    fn truncated_frame_is_plain_data() {
        let layers = decode(&[0x01, 0x02, 0x03], Linktype::ETHERNET);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].protocol, "Data");
        assert!(layers[0].payload);
    }

    #[test]
    fn unknown_link_type_is_plain_data() {
        let layers = decode(&[0u8; 32], Linktype(147));
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].protocol, "Data");
    }

    #[test]
    fn tcp_flag_names() {
        assert_eq!(super::tcp_flags(0x02), "SYN");
        assert_eq!(super::tcp_flags(0x12), "SYN, ACK");
        assert_eq!(super::tcp_flags(0x00), "");
    }
}
