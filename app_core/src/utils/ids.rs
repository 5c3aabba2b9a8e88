//! Entity id generation.
//!
//! Ids are UUIDv7 drawn from one process-wide monotonic context, so id
//! order equals creation order even within a single millisecond. Tie
//! breaks on "earliest player" rely on this.

use std::sync::Mutex;
use uuid::{
    ClockSequence, Timestamp, Uuid,
    timestamp::context::ContextV7,
};

struct SyncContextV7(Mutex<ContextV7>);

impl ClockSequence for SyncContextV7 {
    type Output = u64;

    fn generate_sequence(&self, seconds: u64, subsec_nanos: u32) -> Self::Output {
        self.0.lock().unwrap().generate_sequence(seconds, subsec_nanos)
    }

    fn generate_timestamp_sequence(
        &self,
        seconds: u64,
        subsec_nanos: u32,
    ) -> (Self::Output, u64, u32) {
        self.0
            .lock()
            .unwrap()
            .generate_timestamp_sequence(seconds, subsec_nanos)
    }
}

static V7_CONTEXT: SyncContextV7 = SyncContextV7(Mutex::new(ContextV7::new()));

pub fn new_id() -> Uuid {
    Uuid::new_v7(Timestamp::now(&V7_CONTEXT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_strictly_increasing() {
        let mut prev = new_id();
        for _ in 0..1000 {
            let next = new_id();
            assert!(next > prev);
            prev = next;
        }
    }
}
