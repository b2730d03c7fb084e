//! Shared infrastructure utilities for Croupier.
//!
//! This crate provides cross-cutting utilities that multiple Croupier crates need
//! but that don't belong in the domain-pure `croupier-types` crate:
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename)
//! - **`duration`**: Parsing and formatting of administrative durations

pub mod atomic_write;
pub mod duration;

pub use atomic_write::{
    AtomicWriteOptions, FileSyncPolicy, PersistMode, atomic_write, atomic_write_with_options,
    recover_bak_file,
};
pub use duration::{DurationParseError, format_duration, parse_duration, parse_duration_list};
