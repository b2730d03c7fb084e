//! The engine task.
//!
//! One tokio task owns the [`Engine`] and handles commands one at a time, which makes
//! it the only serialization point for slot and pause state. Publishing a prediction
//! is awaited in place, because the slot cannot exist before the outbound reference
//! does. Amendments and pause announcements run as detached tasks that never touch
//! engine state.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use croupier_core::{Engine, EngineError, EngineSnapshot, LaunchTicket, Reaction, Resolution};
use croupier_types::GameNumber;

use crate::clock::Clock;
use crate::retry::{RetryConfig, with_retry};
use crate::sink::Sink;
use crate::store::StateStore;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_WATCHDOG_PERIOD: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub retry: RetryConfig,
    /// How often the inactivity watchdog is evaluated when enabled.
    pub watchdog_period: Duration,
    pub channel_capacity: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            watchdog_period: DEFAULT_WATCHDOG_PERIOD,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("engine task has stopped")]
    Stopped,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

enum Command<R> {
    Ingest {
        text: String,
        reply: oneshot::Sender<Reaction<R>>,
    },
    ClearSlot {
        reply: oneshot::Sender<Option<GameNumber>>,
    },
    SetEnabled {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },
    ForceStop {
        reply: oneshot::Sender<Option<GameNumber>>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Reconfigure {
        cycle: Vec<Duration>,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Inspect {
        reply: oneshot::Sender<EngineSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable front door to the engine task.
#[derive(Debug)]
pub struct EngineHandle<R> {
    tx: mpsc::Sender<Command<R>>,
}

impl<R> Clone for EngineHandle<R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<R: Send + 'static> EngineHandle<R> {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command<R>,
    ) -> Result<T, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        rx.await.map_err(|_| RuntimeError::Stopped)
    }

    /// Feed one raw event. Resolves once every state change and the publish (if any)
    /// are done.
    pub async fn ingest(&self, text: impl Into<String>) -> Result<Reaction<R>, RuntimeError> {
        let text = text.into();
        self.request(|reply| Command::Ingest { text, reply }).await
    }

    pub async fn clear_slot(&self) -> Result<Option<GameNumber>, RuntimeError> {
        self.request(|reply| Command::ClearSlot { reply }).await
    }

    pub async fn set_predictions_enabled(&self, enabled: bool) -> Result<(), RuntimeError> {
        self.request(|reply| Command::SetEnabled { enabled, reply })
            .await
    }

    pub async fn force_stop(&self) -> Result<Option<GameNumber>, RuntimeError> {
        self.request(|reply| Command::ForceStop { reply }).await
    }

    pub async fn reset(&self) -> Result<(), RuntimeError> {
        self.request(|reply| Command::Reset { reply }).await
    }

    pub async fn reconfigure_pause_cycle(&self, cycle: Vec<Duration>) -> Result<(), RuntimeError> {
        self.request(|reply| Command::Reconfigure { cycle, reply })
            .await?
            .map_err(RuntimeError::from)
    }

    pub async fn inspect(&self) -> Result<EngineSnapshot, RuntimeError> {
        self.request(|reply| Command::Inspect { reply }).await
    }

    /// Stop the task after outstanding amendments and announcements finish.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}

/// Start the engine task.
pub fn spawn<S, C>(
    engine: Engine<S::Ref>,
    sink: S,
    store: Option<StateStore>,
    clock: C,
    options: RuntimeOptions,
) -> (EngineHandle<S::Ref>, JoinHandle<()>)
where
    S: Sink,
    C: Clock,
{
    let (tx, rx) = mpsc::channel(options.channel_capacity.max(1));
    let actor = Actor {
        engine,
        sink: Arc::new(sink),
        store,
        clock,
        retry: options.retry,
        rx,
        outbound: JoinSet::new(),
    };
    let task = tokio::spawn(actor.run(options.watchdog_period));
    (EngineHandle { tx }, task)
}

struct Actor<S: Sink, C> {
    engine: Engine<S::Ref>,
    sink: Arc<S>,
    store: Option<StateStore>,
    clock: C,
    retry: RetryConfig,
    rx: mpsc::Receiver<Command<S::Ref>>,
    outbound: JoinSet<()>,
}

impl<S: Sink, C: Clock> Actor<S, C> {
    async fn run(mut self, watchdog_period: Duration) {
        let watchdog = self.engine.watchdog_idle().is_some();
        let mut ticker = tokio::time::interval(watchdog_period.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(watchdog, "Engine task started");

        let shutdown_reply = loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(Command::Shutdown { reply }) => break Some(reply),
                    Some(cmd) => self.handle(cmd).await,
                    None => break None,
                },
                _ = ticker.tick(), if watchdog => self.watchdog_tick(),
                Some(joined) = self.outbound.join_next(), if !self.outbound.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!("Outbound task failed: {e}");
                    }
                }
            }
        };

        while let Some(joined) = self.outbound.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Outbound task failed: {e}");
            }
        }
        self.persist();
        tracing::info!("Engine task stopped");
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    async fn handle(&mut self, cmd: Command<S::Ref>) {
        match cmd {
            Command::Ingest { text, reply } => {
                let reaction = self.ingest(&text).await;
                let _ = reply.send(reaction);
            }
            Command::ClearSlot { reply } => {
                let _ = reply.send(self.engine.clear_slot());
            }
            Command::SetEnabled { enabled, reply } => {
                self.engine.set_predictions_enabled(enabled);
                let _ = reply.send(());
            }
            Command::ForceStop { reply } => {
                let _ = reply.send(self.engine.force_stop());
            }
            Command::Reset { reply } => {
                self.engine.reset();
                let _ = reply.send(());
            }
            Command::Reconfigure { cycle, reply } => {
                let _ = reply.send(self.engine.reconfigure_pause_cycle(&cycle));
            }
            Command::Inspect { reply } => {
                let _ = reply.send(self.engine.snapshot(self.clock.now()));
            }
            // handled by the run loop
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
        self.persist();
    }

    async fn ingest(&mut self, text: &str) -> Reaction<S::Ref> {
        let reaction = self.engine.observe(text, self.clock.now());
        match &reaction {
            Reaction::Launch(ticket) => self.publish(ticket).await,
            Reaction::Resolved(resolution) => self.spawn_amend(resolution.clone()),
            Reaction::PauseStarted { duration } => self.spawn_announce(*duration),
            _ => {}
        }
        reaction
    }

    async fn publish(&mut self, ticket: &LaunchTicket) {
        let sink = &self.sink;
        let published = with_retry("publish", &self.retry, || {
            sink.publish(ticket.target(), ticket.suit())
        })
        .await;
        match published {
            Ok(outbound_ref) => {
                if let Err(e) = self
                    .engine
                    .commit_launch(ticket, outbound_ref, self.clock.now())
                {
                    tracing::error!(target = ticket.target().get(), "Published prediction not tracked: {e}");
                }
            }
            Err(e) => {
                tracing::error!(target = ticket.target().get(), "Publish failed, prediction dropped: {e}");
                if let Err(e) = self.engine.abandon_launch(ticket) {
                    tracing::warn!("{e}");
                }
            }
        }
    }

    fn spawn_amend(&mut self, resolution: Resolution<S::Ref>) {
        let sink = Arc::clone(&self.sink);
        let retry = self.retry.clone();
        self.outbound.spawn(async move {
            let Resolution {
                target,
                suit,
                outcome,
                outbound_ref,
            } = resolution;
            let amended = with_retry("amend", &retry, || {
                sink.amend(&outbound_ref, target, suit, outcome)
            })
            .await;
            if let Err(e) = amended {
                tracing::error!(target = target.get(), %outcome, "Amend failed; slot already freed: {e}");
            }
        });
    }

    fn spawn_announce(&mut self, duration: Duration) {
        let sink = Arc::clone(&self.sink);
        let retry = self.retry.clone();
        self.outbound.spawn(async move {
            if let Err(e) = with_retry("announce_pause", &retry, || sink.announce_pause(duration)).await {
                tracing::error!(duration_secs = duration.as_secs(), "Pause announcement failed: {e}");
            }
        });
    }

    fn watchdog_tick(&mut self) {
        if let Some(target) = self.engine.watchdog_tick(self.clock.now()) {
            tracing::warn!(target = target.get(), "Watchdog cleared a stalled prediction");
        }
        self.persist();
    }

    fn persist(&mut self) {
        if !self.engine.take_dirty() {
            return;
        }
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(&self.engine.persisted_state()) {
            tracing::error!("Failed to persist engine state: {e}");
        }
    }
}
