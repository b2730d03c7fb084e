//! Sink that prints outbound messages instead of sending them anywhere.

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use croupier_core::render;
use croupier_engine::{Sink, SinkError, SinkFut};
use croupier_types::{GameNumber, Outcome, Suit};

/// Numbers each published message so amendments can point back at it.
#[derive(Debug)]
pub struct ConsoleSink<W> {
    out: Mutex<W>,
    next_id: AtomicU64,
}

impl<W: Write + Send + 'static> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            next_id: AtomicU64::new(0),
        }
    }

    fn emit(&self, heading: &str, body: &str) -> Result<(), SinkError> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| SinkError::Rejected("console writer poisoned".to_string()))?;
        writeln!(out, "── {heading} ──\n{body}\n")
            .and_then(|()| out.flush())
            .map_err(|e| SinkError::Unavailable(e.to_string()))
    }
}

impl<W: Write + Send + 'static> Sink for ConsoleSink<W> {
    type Ref = u64;

    fn publish(&self, target: GameNumber, suit: Suit) -> SinkFut<'_, u64> {
        Box::pin(async move {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            self.emit(&format!("message {id}"), &render::prediction_text(target, suit))?;
            Ok(id)
        })
    }

    fn amend<'a>(
        &'a self,
        outbound_ref: &'a u64,
        target: GameNumber,
        suit: Suit,
        outcome: Outcome,
    ) -> SinkFut<'a, ()> {
        Box::pin(async move {
            self.emit(
                &format!("message {outbound_ref} edited"),
                &render::resolved_text(target, suit, outcome),
            )
        })
    }

    fn announce_pause(&self, duration: Duration) -> SinkFut<'_, ()> {
        Box::pin(async move { self.emit("pause", &render::pause_text(duration)) })
    }
}
