//! Tracepoint handler for `syscalls/sys_enter_openat`.
//!
//! Reserves a slot in the open-event ring, fills it with the issuing task's
//! comm and the user-supplied path, and submits it. Every failure mode ends
//! in "no event, syscall proceeds untouched" — the probe must stay invisible
//! to the traced process.

use aya_ebpf::{
    helpers::{bpf_get_current_comm, bpf_probe_read_user_str_bytes},
    macros::{map, tracepoint},
    maps::RingBuf,
    programs::TracePointContext,
};
use tap_trace_common::{OpenEvent, OPEN_EVENTS_CAPACITY};

#[map]
static OPEN_EVENTS: RingBuf = RingBuf::with_byte_size(OPEN_EVENTS_CAPACITY, 0);

/// Offset of the filename pointer in the raw sys_enter_openat record
/// (common header 16 bytes, dfd 8 bytes, then the path argument).
const FILENAME_ARG_OFFSET: usize = 24;

#[tracepoint]
pub fn sys_enter_openat(ctx: TracePointContext) -> u32 {
    match unsafe { try_sys_enter_openat(ctx) } {
        Ok(ret) => ret,
        Err(_) => 0,
    }
}

unsafe fn try_sys_enter_openat(ctx: TracePointContext) -> Result<u32, i64> {
    let Some(mut entry) = OPEN_EVENTS.reserve::<OpenEvent>(0) else {
        // Ring full: drop this event rather than stall the syscall path.
        return Ok(0);
    };

    let mut event = OpenEvent::new();

    if let Ok(comm) = bpf_get_current_comm() {
        event.parent_comm = comm;
    }

    // A bad path pointer leaves the field empty; the zeroed record still
    // decodes cleanly on the consumer side.
    if let Ok(path_ptr) = ctx.read_at::<*const u8>(FILENAME_ARG_OFFSET) {
        if !path_ptr.is_null() {
            let _ = bpf_probe_read_user_str_bytes(path_ptr, &mut event.requested_path);
        }
    }

    let _ = entry.write(event);
    entry.submit(0);

    Ok(0)
}
