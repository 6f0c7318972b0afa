//! Bounded single-producer/single-consumer event transport.
//!
//! Two realizations of one contract: `reserve` fails fast when the ring is
//! full (the event is dropped, never retried), `submit` publishes a whole
//! record, and `poll` waits out a bounded timeout before handing the
//! consumer everything that arrived, in submission order.
//!
//! `RingBufChannel` drains the kernel ring buffer map the open-monitor
//! handler submits into. `slot_channel` is the in-process counterpart: an
//! arena of preallocated slots indexed by monotonic head/tail counters, no
//! locking and no allocation on the hot path.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aya::maps::{Map, MapData, RingBuf};
use log::warn;
use tokio::io::unix::AsyncFd;
use tokio::sync::Notify;

use crate::errors::{Result, TapTraceError};
use crate::event_processing::parser::decode_open_event;
use tap_trace_common::OpenEvent;

/// Bounded wait per poll; the caller re-checks for cancellation in between.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Consumer side of the transport contract.
pub trait EventChannel {
    /// Waits up to `timeout` for new submissions and returns every record
    /// available, in submission order. An empty batch is a normal timeout;
    /// an error is fatal to the caller.
    #[allow(async_fn_in_trait)]
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<OpenEvent>>;
}

/// Drains the kernel's open-event ring buffer map.
pub struct RingBufChannel {
    ring: AsyncFd<RingBuf<MapData>>,
}

impl RingBufChannel {
    pub fn new(map: Map) -> Result<Self> {
        let ring = RingBuf::try_from(map).map_err(|e| TapTraceError::ChannelSetupFailed {
            source: anyhow::anyhow!("not a ring buffer map: {e}"),
        })?;
        let ring = AsyncFd::new(ring).map_err(|e| TapTraceError::ChannelSetupFailed {
            source: e.into(),
        })?;
        Ok(Self { ring })
    }
}

impl EventChannel for RingBufChannel {
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<OpenEvent>> {
        let mut guard = match tokio::time::timeout(timeout, self.ring.readable_mut()).await {
            Err(_elapsed) => return Ok(Vec::new()),
            Ok(ready) => ready.map_err(|e| TapTraceError::ChannelPollFailed {
                source: e.into(),
            })?,
        };

        let ring = guard.get_inner_mut();
        let mut records = Vec::new();
        while let Some(item) = ring.next() {
            match decode_open_event(&item) {
                Ok(event) => records.push(event),
                // A stray short record is dropped, not fatal.
                Err(e) => warn!("skipping undecodable record: {e}"),
            }
        }
        guard.clear_ready();

        Ok(records)
    }
}

struct SlotRing {
    slots: Box<[UnsafeCell<OpenEvent>]>,
    /// Count of records ever submitted; the producer publishes by advancing
    /// this past the written slot.
    head: AtomicU64,
    /// Count of records ever consumed.
    tail: AtomicU64,
    notify: Notify,
}

// A slot is written only while it is invisible to the consumer (reserved,
// not yet submitted) and read only after the head store that published it;
// the release/acquire pairs on head and tail hand ownership across.
unsafe impl Send for SlotRing {}
unsafe impl Sync for SlotRing {}

impl SlotRing {
    fn capacity(&self) -> u64 {
        self.slots.len() as u64
    }

    fn slot(&self, index: u64) -> *mut OpenEvent {
        self.slots[(index % self.capacity()) as usize].get()
    }
}

/// Creates an in-process channel with `capacity` preallocated slots.
pub fn slot_channel(capacity: usize) -> (SlotProducer, SlotConsumer) {
    assert!(capacity > 0, "slot channel needs at least one slot");
    let ring = Arc::new(SlotRing {
        slots: (0..capacity)
            .map(|_| UnsafeCell::new(OpenEvent::new()))
            .collect(),
        head: AtomicU64::new(0),
        tail: AtomicU64::new(0),
        notify: Notify::new(),
    });
    (
        SlotProducer { ring: ring.clone() },
        SlotConsumer { ring },
    )
}

pub struct SlotProducer {
    ring: Arc<SlotRing>,
}

impl SlotProducer {
    /// Claims the next slot, or `None` when the ring is full. The producer
    /// owns the reservation exclusively until it submits or drops it; a
    /// dropped reservation returns the slot without publishing anything.
    pub fn reserve(&mut self) -> Option<SlotReservation<'_>> {
        let head = self.ring.head.load(Ordering::Relaxed);
        let tail = self.ring.tail.load(Ordering::Acquire);
        if head - tail >= self.ring.capacity() {
            return None;
        }
        Some(SlotReservation {
            ring: &*self.ring,
            index: head,
        })
    }
}

pub struct SlotReservation<'a> {
    ring: &'a SlotRing,
    index: u64,
}

impl SlotReservation<'_> {
    /// Fills the reserved slot. Invisible to the consumer until `submit`.
    pub fn write(&mut self, event: OpenEvent) {
        unsafe { *self.ring.slot(self.index) = event };
    }

    /// Publishes the slot and wakes the consumer.
    pub fn submit(self) {
        self.ring.head.store(self.index + 1, Ordering::Release);
        self.ring.notify.notify_one();
    }
}

pub struct SlotConsumer {
    ring: Arc<SlotRing>,
}

impl EventChannel for SlotConsumer {
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<OpenEvent>> {
        if self.ring.head.load(Ordering::Acquire) == self.ring.tail.load(Ordering::Relaxed) {
            // An elapsed timeout is not an error; the caller polls again.
            let _ = tokio::time::timeout(timeout, self.ring.notify.notified()).await;
        }

        let head = self.ring.head.load(Ordering::Acquire);
        let mut tail = self.ring.tail.load(Ordering::Relaxed);
        let mut records = Vec::with_capacity((head - tail) as usize);
        while tail < head {
            records.push(unsafe { *self.ring.slot(tail) });
            tail += 1;
        }
        self.ring.tail.store(tail, Ordering::Release);

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with_path(path: &str) -> OpenEvent {
        OpenEvent::new()
            .with_parent_comm(b"test")
            .with_requested_path(path.as_bytes())
    }

    #[tokio::test]
    async fn should_deliver_submitted_record() {
        let (mut producer, mut consumer) = slot_channel(4);

        let mut slot = producer.reserve().unwrap();
        slot.write(event_with_path("/tmp/a"));
        slot.submit();

        let records = consumer.poll(POLL_TIMEOUT).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].requested_path_as_str(), "/tmp/a");
    }

    #[tokio::test]
    async fn should_return_empty_batch_on_timeout() {
        let (_producer, mut consumer) = slot_channel(4);

        let records = consumer.poll(Duration::from_millis(1)).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn should_not_publish_dropped_reservation() {
        let (mut producer, mut consumer) = slot_channel(4);

        {
            let mut slot = producer.reserve().unwrap();
            slot.write(event_with_path("/abandoned"));
            // dropped without submit
        }

        let records = consumer.poll(Duration::from_millis(1)).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn should_reuse_slots_after_consumption() {
        let (mut producer, mut consumer) = slot_channel(2);

        for round in 0..5 {
            let mut slot = producer.reserve().unwrap();
            slot.write(event_with_path(&format!("/round/{round}")));
            slot.submit();

            let records = consumer.poll(POLL_TIMEOUT).await.unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(
                records[0].requested_path_as_str(),
                format!("/round/{round}")
            );
        }
    }

    #[tokio::test]
    async fn should_preserve_order_across_threads() {
        let (mut producer, mut consumer) = slot_channel(8);
        const COUNT: usize = 200;

        let handle = std::thread::spawn(move || {
            for i in 0..COUNT {
                loop {
                    match producer.reserve() {
                        Some(mut slot) => {
                            slot.write(event_with_path(&format!("/seq/{i}")));
                            slot.submit();
                            break;
                        }
                        None => std::thread::yield_now(),
                    }
                }
            }
        });

        let mut received = Vec::new();
        while received.len() < COUNT {
            received.extend(consumer.poll(POLL_TIMEOUT).await.unwrap());
        }
        handle.join().unwrap();

        for (i, record) in received.iter().enumerate() {
            assert_eq!(record.requested_path_as_str(), format!("/seq/{i}"));
        }
    }
}
