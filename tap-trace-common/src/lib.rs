#![no_std]

#[cfg(test)]
extern crate std;
#[cfg(test)]
use std::vec;

pub mod packet;

pub const OPEN_EVENTS_MAP: &str = "OPEN_EVENTS";

/// Byte capacity of the open-event ring buffer map.
pub const OPEN_EVENTS_CAPACITY: u32 = 1024;

pub const PARENT_COMM_LEN: usize = 16;
pub const REQUESTED_PATH_LEN: usize = 128;

/// One intercepted `openat(2)` entry. Produced in kernel context, decoded by
/// the userspace consumer; the layout is shared verbatim across that boundary.
///
/// Both fields are zero-initialized before any copy, so a transported record
/// is always fully NUL-terminated and padded regardless of how much of each
/// buffer the copy filled.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct OpenEvent {
    pub parent_comm: [u8; PARENT_COMM_LEN],
    pub requested_path: [u8; REQUESTED_PATH_LEN],
}

#[cfg(feature = "user")]
unsafe impl aya::Pod for OpenEvent {}

impl OpenEvent {
    pub fn new() -> Self {
        Self {
            parent_comm: [0u8; PARENT_COMM_LEN],
            requested_path: [0u8; REQUESTED_PATH_LEN],
        }
    }

    /// Bounded copy of the issuing task's short name. Truncates silently,
    /// keeping the final byte as NUL.
    pub fn with_parent_comm(mut self, comm: &[u8]) -> Self {
        let copy_len = comm.len().min(PARENT_COMM_LEN - 1);
        self.parent_comm[..copy_len].copy_from_slice(&comm[..copy_len]);
        self
    }

    /// Bounded copy of the syscall's path argument, at most capacity - 1
    /// bytes, matching what `bpf_probe_read_user_str_bytes` leaves in the
    /// field on the producer side.
    pub fn with_requested_path(mut self, path: &[u8]) -> Self {
        let copy_len = path.len().min(REQUESTED_PATH_LEN - 1);
        self.requested_path[..copy_len].copy_from_slice(&path[..copy_len]);
        self
    }

    pub fn parent_comm_as_str(&self) -> &str {
        str_until_nul(&self.parent_comm)
    }

    pub fn requested_path_as_str(&self) -> &str {
        str_until_nul(&self.requested_path)
    }
}

impl Default for OpenEvent {
    fn default() -> Self {
        Self::new()
    }
}

fn str_until_nul(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    core::str::from_utf8(&bytes[..end]).unwrap_or("<invalid>")
}
