//! XDP handler that logs the source address of every ingress frame.
//!
//! Pure observer: whatever the classification outcome, the frame continues
//! through the normal network stack. Each header read is preceded by a
//! bounds check against `data_end`; a truncated frame aborts classification
//! for that invocation and nothing is logged.

use core::mem;

use aya_ebpf::{bindings::xdp_action, macros::xdp, programs::XdpContext};
use aya_log_ebpf::info;
use tap_trace_common::packet::{EthHdr, Ipv4Hdr, Ipv6Hdr, ETH_P_IP};

#[xdp]
pub fn source_printer(ctx: XdpContext) -> u32 {
    let _ = try_source_printer(&ctx);
    xdp_action::XDP_PASS
}

/// Widens the read window by `size_of::<T>()` at `offset`, only if the frame
/// actually holds that many bytes.
#[inline(always)]
fn ptr_at<T>(ctx: &XdpContext, offset: usize) -> Option<*const T> {
    let start = ctx.data();
    let end = ctx.data_end();

    if start + offset + mem::size_of::<T>() > end {
        return None;
    }

    Some((start + offset) as *const T)
}

fn try_source_printer(ctx: &XdpContext) -> Option<()> {
    let eth = ptr_at::<EthHdr>(ctx, 0)?;

    if u16::from_be(unsafe { (*eth).ether_type }) == ETH_P_IP {
        let ip = ptr_at::<Ipv4Hdr>(ctx, EthHdr::LEN)?;
        let saddr = unsafe { (*ip).src_addr };

        // Raw stored octets, low byte first; no network-to-host swap.
        info!(
            ctx,
            "received source ip: {}.{}.{}.{}",
            (saddr & 0xff) as u8,
            ((saddr >> 8) & 0xff) as u8,
            ((saddr >> 16) & 0xff) as u8,
            ((saddr >> 24) & 0xff) as u8
        );
    } else {
        // Anything that is not IPv4 is read as IPv6; the length check below
        // still protects the access on frames that are neither.
        let ip6 = ptr_at::<Ipv6Hdr>(ctx, EthHdr::LEN)?;
        let groups = unsafe { (*ip6).src_addr };

        info!(
            ctx,
            "received source ipv6: {:x}:{:x}:{:x}:{:x}:{:x}:{:x}:{:x}:{:x}",
            groups[0],
            groups[1],
            groups[2],
            groups[3],
            groups[4],
            groups[5],
            groups[6],
            groups[7]
        );
    }

    Some(())
}
