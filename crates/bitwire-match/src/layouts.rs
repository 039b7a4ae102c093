//! 常见协议的报文头布局常量。
//!
//! 报文头依次相接：以太网头从第 0 位开始，三层头紧随其后，四层头再紧随三层头。
//! 不考虑 VLAN 标签与 IPv4/IPv6 的可变长选项，三层头按最小长度计算。

use crate::layout::{BitField, BitHeader};

const MAC_ADDR_BITS: usize = 48;
const ETH_TYPE_BITS: usize = 16;
const IP_PROTO_BITS: usize = 8;
const IPV4_ADDR_BITS: usize = 32;
const ICMPV4_TYPE_BITS: usize = 8;
const ICMPV4_CODE_BITS: usize = 8;
const L4_PORT_BITS: usize = 16;
const ARP_OP_BITS: usize = 16;
const IPV6_ADDR_BITS: usize = 128;

const fn bytes(count: usize) -> usize {
    count * 8
}

const fn header_after(previous: BitHeader, length_bytes: usize) -> BitHeader {
    match previous.next_header(bytes(length_bytes)) {
        Ok(header) => header,
        Err(_) => panic!("layout header overflows"),
    }
}

const fn field(header: BitHeader, offset_bytes: usize, bit_length: usize) -> BitField {
    match header.field_at(bytes(offset_bytes), bit_length) {
        Ok(field) => field,
        Err(_) => panic!("layout field exceeds its header"),
    }
}

/// 以太网（二层）。
pub mod eth {
    use super::*;

    pub const HEADER: BitHeader = match BitHeader::new(0, bytes(14)) {
        Ok(header) => header,
        Err(_) => panic!("ethernet header overflows"),
    };
    pub const DEST: BitField = field(HEADER, 0, MAC_ADDR_BITS);
    pub const SRC: BitField = field(HEADER, 6, MAC_ADDR_BITS);
    pub const TYPE: BitField = field(HEADER, 12, ETH_TYPE_BITS);
}

/// 以太网之上的 IPv4（三层）。
pub mod ipv4 {
    use super::*;

    pub const HEADER: BitHeader = header_after(eth::HEADER, 20);
    pub const PROTO: BitField = field(HEADER, 9, IP_PROTO_BITS);
    pub const SRC: BitField = field(HEADER, 12, IPV4_ADDR_BITS);
    pub const DEST: BitField = field(HEADER, 16, IPV4_ADDR_BITS);
}

/// IPv4 之上的 ICMPv4。
pub mod icmpv4 {
    use super::*;

    pub const HEADER: BitHeader = header_after(ipv4::HEADER, 8);
    pub const TYPE: BitField = field(HEADER, 0, ICMPV4_TYPE_BITS);
    pub const CODE: BitField = field(HEADER, 1, ICMPV4_CODE_BITS);
}

/// IPv4 之上的 TCP。
pub mod ipv4_tcp {
    use super::*;

    pub const HEADER: BitHeader = header_after(ipv4::HEADER, 20);
    pub const SRC: BitField = field(HEADER, 0, L4_PORT_BITS);
    pub const DEST: BitField = field(HEADER, 2, L4_PORT_BITS);
}

/// IPv4 之上的 UDP。
pub mod ipv4_udp {
    use super::*;

    pub const HEADER: BitHeader = header_after(ipv4::HEADER, 8);
    pub const SRC: BitField = field(HEADER, 0, L4_PORT_BITS);
    pub const DEST: BitField = field(HEADER, 2, L4_PORT_BITS);
}

/// 以太网之上的 ARP。
pub mod arp {
    use super::*;

    pub const HEADER: BitHeader = header_after(eth::HEADER, 28);
    pub const OP: BitField = field(HEADER, 6, ARP_OP_BITS);
    pub const SHA: BitField = field(HEADER, 8, MAC_ADDR_BITS);
    pub const SPA: BitField = field(HEADER, 14, IPV4_ADDR_BITS);
    pub const THA: BitField = field(HEADER, 18, MAC_ADDR_BITS);
    pub const TPA: BitField = field(HEADER, 24, IPV4_ADDR_BITS);
}

/// 以太网之上的 IPv6（三层）。
pub mod ipv6 {
    use super::*;

    pub const HEADER: BitHeader = header_after(eth::HEADER, 40);
    pub const PROTO: BitField = field(HEADER, 6, IP_PROTO_BITS);
    pub const SRC: BitField = field(HEADER, 8, IPV6_ADDR_BITS);
    pub const DEST: BitField = field(HEADER, 24, IPV6_ADDR_BITS);
}

/// IPv6 之上的 TCP。
pub mod ipv6_tcp {
    use super::*;

    pub const HEADER: BitHeader = header_after(ipv6::HEADER, 20);
    pub const SRC: BitField = field(HEADER, 0, L4_PORT_BITS);
    pub const DEST: BitField = field(HEADER, 2, L4_PORT_BITS);
}

/// IPv6 之上的 UDP。
pub mod ipv6_udp {
    use super::*;

    pub const HEADER: BitHeader = header_after(ipv6::HEADER, 8);
    pub const SRC: BitField = field(HEADER, 0, L4_PORT_BITS);
    pub const DEST: BitField = field(HEADER, 2, L4_PORT_BITS);
}
