//! Bounds-checked parsing of raw frame bytes.
//!
//! Every access to a header is preceded by an explicit length check against
//! the end of the frame; a frame too short for the header it claims to carry
//! classifies as nothing at all. The same header layouts back the in-kernel
//! XDP program, which performs the equivalent checks against `data_end`
//! before each widened read.

use core::fmt;
use core::mem;

/// EtherType for IPv4, host byte order.
pub const ETH_P_IP: u16 = 0x0800;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct EthHdr {
    pub dst_addr: [u8; 6],
    pub src_addr: [u8; 6],
    /// Big-endian on the wire.
    pub ether_type: u16,
}

impl EthHdr {
    pub const LEN: usize = mem::size_of::<EthHdr>();
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct Ipv4Hdr {
    pub version_ihl: u8,
    pub tos: u8,
    pub tot_len: u16,
    pub id: u16,
    pub frag_off: u16,
    pub ttl: u8,
    pub proto: u8,
    pub check: u16,
    /// Kept as the raw stored word; see [`SourceAddr`] for how it renders.
    pub src_addr: u32,
    pub dst_addr: u32,
}

impl Ipv4Hdr {
    pub const LEN: usize = mem::size_of::<Ipv4Hdr>();
    pub const SRC_ADDR_OFFSET: usize = mem::offset_of!(Ipv4Hdr, src_addr);
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct Ipv6Hdr {
    pub version_class_flow: [u8; 4],
    pub payload_len: u16,
    pub next_hdr: u8,
    pub hop_limit: u8,
    /// Eight 16-bit groups as stored in the frame.
    pub src_addr: [u16; 8],
    pub dst_addr: [u16; 8],
}

impl Ipv6Hdr {
    pub const LEN: usize = mem::size_of::<Ipv6Hdr>();
    pub const SRC_ADDR_OFFSET: usize = mem::offset_of!(Ipv6Hdr, src_addr);
}

/// Source address extracted from a classified frame.
///
/// V4 holds the four octets in storage order and renders them without a
/// network-to-host swap (`b0.b1.b2.b3`). This reproduces the tool's
/// long-standing output format; on the little-endian targets BPF runs on it
/// coincides with the conventional dotted quad, but it is a raw-byte dump,
/// not an ntohl conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceAddr {
    V4([u8; 4]),
    V6([u16; 8]),
}

impl fmt::Display for SourceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceAddr::V4(octets) => write!(
                f,
                "{}.{}.{}.{}",
                octets[0], octets[1], octets[2], octets[3]
            ),
            SourceAddr::V6(groups) => write!(
                f,
                "{:04x}:{:04x}:{:04x}:{:04x}:{:04x}:{:04x}:{:04x}:{:04x}",
                groups[0],
                groups[1],
                groups[2],
                groups[3],
                groups[4],
                groups[5],
                groups[6],
                groups[7]
            ),
        }
    }
}

/// Reads the EtherType, provided the frame holds a full Ethernet header.
pub fn ethernet_type(frame: &[u8]) -> Option<u16> {
    if frame.len() < EthHdr::LEN {
        return None;
    }
    let off = EthHdr::LEN - 2;
    Some(u16::from_be_bytes([frame[off], frame[off + 1]]))
}

fn ipv4_source(frame: &[u8]) -> Option<[u8; 4]> {
    if frame.len() < EthHdr::LEN + Ipv4Hdr::LEN {
        return None;
    }
    let off = EthHdr::LEN + Ipv4Hdr::SRC_ADDR_OFFSET;
    Some([frame[off], frame[off + 1], frame[off + 2], frame[off + 3]])
}

fn ipv6_source(frame: &[u8]) -> Option<[u16; 8]> {
    if frame.len() < EthHdr::LEN + Ipv6Hdr::LEN {
        return None;
    }
    let off = EthHdr::LEN + Ipv6Hdr::SRC_ADDR_OFFSET;
    let mut groups = [0u16; 8];
    for (i, group) in groups.iter_mut().enumerate() {
        *group = u16::from_ne_bytes([frame[off + 2 * i], frame[off + 2 * i + 1]]);
    }
    Some(groups)
}

/// Classifies a frame and extracts its source address.
///
/// IPv4 frames are recognized by EtherType; anything else is treated as
/// IPv6, with the bounds check still guarding the read. Returns `None`
/// whenever the frame is too short for the header being inspected.
pub fn classify_source(frame: &[u8]) -> Option<SourceAddr> {
    let ether_type = ethernet_type(frame)?;
    if ether_type == ETH_P_IP {
        ipv4_source(frame).map(SourceAddr::V4)
    } else {
        ipv6_source(frame).map(SourceAddr::V6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::format;
    use std::vec;
    use std::vec::Vec;

    fn ipv4_frame(src: [u8; 4]) -> Vec<u8> {
        let mut frame = vec![0u8; EthHdr::LEN + Ipv4Hdr::LEN];
        frame[12] = 0x08;
        frame[13] = 0x00;
        let off = EthHdr::LEN + Ipv4Hdr::SRC_ADDR_OFFSET;
        frame[off..off + 4].copy_from_slice(&src);
        frame
    }

    fn ipv6_frame() -> Vec<u8> {
        let mut frame = vec![0u8; EthHdr::LEN + Ipv6Hdr::LEN];
        frame[12] = 0x86;
        frame[13] = 0xdd;
        frame
    }

    mod header_layout {
        use super::*;

        #[test]
        fn should_match_wire_sizes() {
            assert_eq!(EthHdr::LEN, 14);
            assert_eq!(Ipv4Hdr::LEN, 20);
            assert_eq!(Ipv6Hdr::LEN, 40);
        }

        #[test]
        fn should_place_source_addresses_at_wire_offsets() {
            assert_eq!(Ipv4Hdr::SRC_ADDR_OFFSET, 12);
            assert_eq!(Ipv6Hdr::SRC_ADDR_OFFSET, 8);
        }
    }

    mod truncated_frames {
        use super::*;

        #[test]
        fn should_ignore_frame_shorter_than_ethernet_header() {
            let frame = vec![0u8; EthHdr::LEN - 1];

            assert_matches!(classify_source(&frame), None);
        }

        #[test]
        fn should_ignore_empty_frame() {
            assert_matches!(classify_source(&[]), None);
        }

        #[test]
        fn should_ignore_ipv4_frame_with_truncated_ip_header() {
            let mut frame = ipv4_frame([10, 0, 0, 1]);
            frame.truncate(EthHdr::LEN + Ipv4Hdr::LEN - 1);

            assert_matches!(classify_source(&frame), None);
        }

        #[test]
        fn should_ignore_ipv6_frame_with_truncated_ip_header() {
            let mut frame = ipv6_frame();
            frame.truncate(EthHdr::LEN + Ipv6Hdr::LEN - 1);

            assert_matches!(classify_source(&frame), None);
        }
    }

    mod ipv4_classification {
        use super::*;

        #[test]
        fn should_extract_source_octets_in_storage_order() {
            let frame = ipv4_frame([1, 2, 3, 4]);

            assert_matches!(classify_source(&frame), Some(SourceAddr::V4([1, 2, 3, 4])));
        }

        #[test]
        fn should_render_raw_octets_as_dotted_quad() {
            let addr = SourceAddr::V4([1, 2, 3, 4]);

            assert_eq!(format!("{}", addr), "1.2.3.4");
        }

        #[test]
        fn should_accept_frame_with_payload_beyond_headers() {
            let mut frame = ipv4_frame([192, 168, 0, 7]);
            frame.extend_from_slice(&[0u8; 64]);

            assert_matches!(
                classify_source(&frame),
                Some(SourceAddr::V4([192, 168, 0, 7]))
            );
        }
    }

    mod ipv6_classification {
        use super::*;

        #[test]
        fn should_treat_any_other_ethertype_as_ipv6() {
            let mut frame = vec![0u8; EthHdr::LEN + Ipv6Hdr::LEN];
            // ARP, but there is no explicit IPv6 check by design
            frame[12] = 0x08;
            frame[13] = 0x06;

            assert_matches!(classify_source(&frame), Some(SourceAddr::V6(_)));
        }

        #[test]
        fn should_render_all_zero_source_with_padded_groups() {
            let frame = ipv6_frame();
            let addr = classify_source(&frame).unwrap();

            assert_eq!(
                format!("{}", addr),
                "0000:0000:0000:0000:0000:0000:0000:0000"
            );
        }

        #[test]
        fn should_render_groups_as_lowercase_hex() {
            let addr = SourceAddr::V6([0xfe80, 0, 0, 0, 0, 0, 0, 0x0001]);

            assert_eq!(
                format!("{}", addr),
                "fe80:0000:0000:0000:0000:0000:0000:0001"
            );
        }
    }

    mod ethernet_type_reads {
        use super::*;

        #[test]
        fn should_read_ethertype_big_endian() {
            let frame = ipv4_frame([0, 0, 0, 0]);

            assert_eq!(ethernet_type(&frame), Some(ETH_P_IP));
        }

        #[test]
        fn should_refuse_ethertype_read_on_short_frame() {
            let frame = vec![0u8; 13];

            assert_eq!(ethernet_type(&frame), None);
        }
    }
}
