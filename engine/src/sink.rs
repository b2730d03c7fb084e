//! Outbound transport seam.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use croupier_types::{GameNumber, Outcome, Suit};

pub type SinkFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, SinkError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// Transient failure; worth retrying.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    /// The transport refused the message; retrying will not help.
    #[error("message rejected: {0}")]
    Rejected(String),
}

impl SinkError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SinkError::Unavailable(_))
    }
}

/// Where predictions are published.
///
/// `Ref` is whatever the transport needs to edit a published message later, such as a
/// message id.
pub trait Sink: Send + Sync + 'static {
    type Ref: Clone + Debug + Send + Sync + 'static;

    fn publish(&self, target: GameNumber, suit: Suit) -> SinkFut<'_, Self::Ref>;

    /// Rewrite a published prediction with its outcome.
    fn amend<'a>(
        &'a self,
        outbound_ref: &'a Self::Ref,
        target: GameNumber,
        suit: Suit,
        outcome: Outcome,
    ) -> SinkFut<'a, ()>;

    fn announce_pause(&self, duration: Duration) -> SinkFut<'_, ()>;
}
