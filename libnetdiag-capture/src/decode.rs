use libnetdiag_tools::Duration;
use pcap_parser::data::{get_packetdata, PacketData};
use pcap_parser::Linktype;
use pnet_packet::ethernet::{EtherTypes, EthernetPacket};
use pnet_packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::tcp::{TcpFlags, TcpPacket};
use pnet_packet::udp::UdpPacket;
use pnet_packet::Packet;
use tracing::trace;

use crate::classify::{format_payload, hex_string, parse_http};
use crate::record::PacketRecord;

/// Ports on which TCP payloads are additionally inspected for HTTP framing.
const HTTP_PORTS: [u16; 3] = [80, 443, 8080];

/// Decode one raw frame into a `PacketRecord`.
///
/// Decoding is layered and best-effort: network layer (IPv4), then transport
/// (TCP, then UDP), then application payload. A missing or unparsable layer
/// leaves its fields at their zero value and never fails the frame; length
/// and timestamp are always populated.
pub fn decode_frame(
    data: &[u8],
    link_type: Linktype,
    caplen: u32,
    ts: Duration,
    origlen: u32,
) -> PacketRecord {
    let mut record = PacketRecord {
        ts,
        length: origlen,
        ..Default::default()
    };

    match get_packetdata(data, link_type, caplen as usize) {
        Some(PacketData::L2(l2)) => {
            if let Some(eth) = EthernetPacket::new(l2) {
                if eth.get_ethertype() == EtherTypes::Ipv4 {
                    decode_ipv4(&l2[14..], &mut record);
                }
            }
        }
        Some(PacketData::L3(ethertype, l3)) => {
            if ethertype == EtherTypes::Ipv4.0 {
                decode_ipv4(l3, &mut record);
            }
        }
        _ => trace!("link type {link_type:?}: no layered decode"),
    }

    record
}

fn decode_ipv4(data: &[u8], record: &mut PacketRecord) {
    let ipv4 = match Ipv4Packet::new(data) {
        Some(ipv4) => ipv4,
        None => return,
    };
    record.src_ip = ipv4.get_source().to_string();
    record.dst_ip = ipv4.get_destination().to_string();
    let proto = ipv4.get_next_level_protocol();
    // provisional label from the IP protocol number, overridden by a
    // successful transport decode
    record.protocol = protocol_name(proto);

    match proto {
        IpNextHeaderProtocols::Tcp => decode_tcp(ipv4.payload(), record),
        IpNextHeaderProtocols::Udp => decode_udp(ipv4.payload(), record),
        _ => (),
    }
}

fn decode_tcp(data: &[u8], record: &mut PacketRecord) {
    if let Some(ref tcp) = TcpPacket::new(data) {
        record.src_port = tcp.get_source();
        record.dst_port = tcp.get_destination();
        record.protocol = "TCP".to_owned();
        let flags = tcp_flags_info(tcp.get_flags());
        if !flags.is_empty() {
            record.info = format!("Flags: {flags}");
        }
        handle_app_payload(tcp.payload(), record);
    }
}

fn decode_udp(data: &[u8], record: &mut PacketRecord) {
    if let Some(ref udp) = UdpPacket::new(data) {
        record.src_port = udp.get_source();
        record.dst_port = udp.get_destination();
        record.protocol = "UDP".to_owned();
        handle_app_payload(udp.payload(), record);
    }
}

fn handle_app_payload(payload: &[u8], record: &mut PacketRecord) {
    if payload.is_empty() {
        return;
    }
    record.raw_data = hex_string(payload);
    record.payload = format_payload(payload);
    if record.protocol == "TCP"
        && (HTTP_PORTS.contains(&record.src_port) || HTTP_PORTS.contains(&record.dst_port))
    {
        record.http = parse_http(payload);
    }
}

/// Set control flags in fixed SYN,ACK,FIN,RST order, comma-joined.
fn tcp_flags_info(flags: u8) -> String {
    let mut set = Vec::new();
    if flags & TcpFlags::SYN != 0 {
        set.push("SYN");
    }
    if flags & TcpFlags::ACK != 0 {
        set.push("ACK");
    }
    if flags & TcpFlags::FIN != 0 {
        set.push("FIN");
    }
    if flags & TcpFlags::RST != 0 {
        set.push("RST");
    }
    set.join(",")
}

fn protocol_name(proto: IpNextHeaderProtocol) -> String {
    match proto {
        IpNextHeaderProtocols::Tcp => "TCP".to_owned(),
        IpNextHeaderProtocols::Udp => "UDP".to_owned(),
        IpNextHeaderProtocols::Icmp => "ICMP".to_owned(),
        IpNextHeaderProtocols::Icmpv6 => "ICMPv6".to_owned(),
        IpNextHeaderProtocols::Igmp => "IGMP".to_owned(),
        _ => proto.0.to_string(),
    }
}
