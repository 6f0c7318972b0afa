//! Safe decoding of transported records.
//!
//! The producer only ever submits whole, fully initialized records, so a
//! short buffer here means the bytes did not come from the open pipeline;
//! it is rejected rather than reinterpreted.

use crate::errors::{Result, TapTraceError};
use tap_trace_common::OpenEvent;

pub fn decode_open_event(buffer: &[u8]) -> Result<OpenEvent> {
    if buffer.is_empty() {
        return Err(TapTraceError::MalformedRecord {
            message: "empty buffer".to_string(),
        });
    }

    let required = std::mem::size_of::<OpenEvent>();
    if buffer.len() < required {
        return Err(TapTraceError::MalformedRecord {
            message: format!(
                "buffer size {} is smaller than required size {}",
                buffer.len(),
                required
            ),
        });
    }

    Ok(unsafe { buffer.as_ptr().cast::<OpenEvent>().read_unaligned() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_bytes(event: &OpenEvent) -> &[u8] {
        unsafe {
            std::slice::from_raw_parts(
                (event as *const OpenEvent).cast::<u8>(),
                std::mem::size_of::<OpenEvent>(),
            )
        }
    }

    #[test]
    fn should_decode_record_with_exact_size() {
        let event = OpenEvent::new()
            .with_parent_comm(b"cat")
            .with_requested_path(b"/etc/hosts");

        let decoded = decode_open_event(as_bytes(&event)).unwrap();

        assert_eq!(decoded.parent_comm_as_str(), "cat");
        assert_eq!(decoded.requested_path_as_str(), "/etc/hosts");
    }

    #[test]
    fn should_decode_record_with_trailing_bytes() {
        let event = OpenEvent::new().with_parent_comm(b"sh");
        let mut buffer = as_bytes(&event).to_vec();
        buffer.extend_from_slice(&[0xAA; 8]);

        let decoded = decode_open_event(&buffer).unwrap();

        assert_eq!(decoded.parent_comm_as_str(), "sh");
    }

    #[test]
    fn should_reject_empty_buffer() {
        let result = decode_open_event(&[]);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty buffer"));
    }

    #[test]
    fn should_reject_undersized_buffer() {
        let buffer = vec![0u8; std::mem::size_of::<OpenEvent>() - 1];

        let result = decode_open_event(&buffer);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("smaller than"));
    }
}
