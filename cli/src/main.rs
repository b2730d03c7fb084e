//! Croupier CLI - feeds a result stream into the engine.
//!
//! Every stdin line is either a raw result message or a `/command` (see
//! [`commands::HELP`]). Predictions, amendments and pause announcements are printed to
//! stdout by a [`console::ConsoleSink`]; logs go to `~/.croupier/logs/croupier.log`.
//!
//! ```text
//! stdin -> parse_line -> EngineHandle -> engine task -> ConsoleSink -> stdout
//!                                             |
//!                                             v
//!                                    ~/.croupier/state.json
//! ```

mod commands;
mod console;

use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use croupier_config::{CroupierConfig, RetrySection, croupier_dir};
use croupier_core::{Engine, render};
use croupier_engine::{
    EngineHandle, RetryConfig, RuntimeError, RuntimeOptions, StateStore, SystemClock, spawn,
};
use croupier_utils::format_duration;

use crate::commands::{Command, HELP, Line, parse_line};
use crate::console::ConsoleSink;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // stdout carries the published messages; keep logs off it.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.croupier/logs/croupier.log
    if let Some(dir) = croupier_dir() {
        candidates.push(dir.join("logs").join("croupier.log"));
    }

    // Fallback: ./.croupier/logs/croupier.log
    candidates.push(PathBuf::from(".croupier").join("logs").join("croupier.log"));

    candidates
}

fn retry_config(section: Option<&RetrySection>) -> RetryConfig {
    let mut retry = RetryConfig::default();
    let Some(section) = section else {
        return retry;
    };
    if let Some(max_retries) = section.max_retries {
        retry.max_retries = max_retries;
    }
    if let Some(ms) = section.initial_delay_ms {
        retry.initial_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = section.max_delay_ms {
        retry.max_delay = Duration::from_millis(ms);
    }
    retry
}

fn cycle_text(cycle: &[Duration]) -> String {
    cycle
        .iter()
        .map(|d| format_duration(*d))
        .collect::<Vec<_>>()
        .join(", ")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = CroupierConfig::load()
        .context("failed to load config")?
        .unwrap_or_default();
    let settings = config.engine_settings().context("invalid config")?;

    let store = config.state_path().map(StateStore::new);
    let saved = match &store {
        Some(store) => store
            .load()
            .with_context(|| format!("failed to load state from {}", store.path().display()))?,
        None => {
            tracing::warn!("No home directory and no storage.state_path; state will not persist");
            None
        }
    };
    let engine = match saved {
        Some(state) => Engine::restore(settings, state),
        None => Engine::new(settings)?,
    };

    let options = RuntimeOptions {
        retry: retry_config(config.retry.as_ref()),
        ..RuntimeOptions::default()
    };
    let sink = ConsoleSink::new(std::io::stdout());
    let (handle, task) = spawn(engine, sink, store, SystemClock, options);

    let result = run(&handle).await;

    if let Err(e) = handle.shutdown().await {
        tracing::warn!("Engine shutdown: {e}");
    }
    task.await.context("engine task failed")?;
    result
}

async fn run(handle: &EngineHandle<u64>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                return Ok(());
            }
        };
        let Some(line) = line else {
            tracing::info!("Input closed");
            return Ok(());
        };
        if !dispatch(handle, &line).await? {
            return Ok(());
        }
    }
}

/// Handle one input line. `Ok(false)` asks the loop to stop.
async fn dispatch(handle: &EngineHandle<u64>, line: &str) -> Result<bool> {
    let command = match parse_line(line) {
        Line::Blank => return Ok(true),
        Line::Event(text) => {
            let reaction = handle.ingest(text).await?;
            tracing::debug!(?reaction, "Event handled");
            return Ok(true);
        }
        Line::Unknown(name) => {
            println!("Commande inconnue: /{name} (voir /help)");
            return Ok(true);
        }
        Line::BadCycle(e) => {
            println!("Cycle invalide: {e}");
            return Ok(true);
        }
        Line::Command(command) => command,
    };

    match command {
        Command::Stop => {
            handle.set_predictions_enabled(false).await?;
            println!("⏹️ Prédictions suspendues");
        }
        Command::Resume => {
            handle.set_predictions_enabled(true).await?;
            println!("▶️ Prédictions reprises");
        }
        Command::ForceStop => match handle.force_stop().await? {
            Some(target) => println!("🛑 Arrêt forcé, prédiction #{target} abandonnée"),
            None => println!("🛑 Arrêt forcé"),
        },
        Command::ClearVerification => match handle.clear_slot().await? {
            Some(target) => println!("🧹 Vérification #{target} effacée"),
            None => println!("Aucune vérification en cours"),
        },
        Command::PauseCycle(None) => {
            let snapshot = handle.inspect().await?;
            println!("Cycle: {}", cycle_text(&snapshot.pause.cycle));
        }
        Command::PauseCycle(Some(cycle)) => {
            let text = cycle_text(&cycle);
            match handle.reconfigure_pause_cycle(cycle).await {
                Ok(()) => println!("Cycle mis à jour: {text}"),
                Err(RuntimeError::Engine(e)) => println!("Cycle refusé: {e}"),
                Err(e) => return Err(e.into()),
            }
        }
        Command::Inspect => {
            println!("{}", render::snapshot_text(&handle.inspect().await?));
        }
        Command::Stats => {
            let snapshot = handle.inspect().await?;
            println!("{}", render::stats_text(&snapshot.tally, snapshot.max_offset));
        }
        Command::Reset => {
            handle.reset().await?;
            println!("♻️ Statistiques remises à zéro");
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}
