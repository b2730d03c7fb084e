//! Async runtime around the Croupier engine.
//!
//! [`spawn`] moves an [`croupier_core::Engine`] into its own task and hands back an
//! [`EngineHandle`]. Outbound messages go through a [`Sink`]; state that must survive
//! a restart goes through a [`StateStore`].

mod clock;
mod retry;
mod runtime;
mod sink;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use retry::{RetryConfig, calculate_retry_delay, with_retry};
pub use runtime::{EngineHandle, RuntimeError, RuntimeOptions, spawn};
pub use sink::{Sink, SinkError, SinkFut};
pub use store::{StateStore, StoreError};
