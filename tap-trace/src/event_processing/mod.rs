//! Event processing: the userspace half of the open pipeline.
//!
//! Records flow kernel handler → bounded channel → consumer loop. The
//! channel is a trait seam so the consumer can be driven by the kernel ring
//! buffer in production and by the in-process slot ring in tests.
//!
//! Key components:
//! - EventChannel: the poll side of the bounded transport contract
//! - decode_open_event: safe record decoding at the trust boundary
//! - ConsumerLoop: polls, decodes, renders one line per record

pub mod channel;
pub mod consumer;
pub mod parser;

pub use channel::{
    slot_channel, EventChannel, RingBufChannel, SlotConsumer, SlotProducer, POLL_TIMEOUT,
};
pub use consumer::ConsumerLoop;
pub use parser::decode_open_event;
