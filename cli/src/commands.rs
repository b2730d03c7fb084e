//! Administrative commands typed on stdin.
//!
//! A line starting with `/` is a command; anything else is fed to the engine as a raw
//! result event.

use std::time::Duration;

use croupier_utils::{DurationParseError, parse_duration_list};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Disable new predictions. A pending one is still verified.
    Stop,
    Resume,
    /// Disable predictions, drop the pending one and forget used targets.
    ForceStop,
    /// Drop the pending prediction without counting it.
    ClearVerification,
    /// Show the pause cycle, or replace it when durations are given.
    PauseCycle(Option<Vec<Duration>>),
    Inspect,
    Stats,
    Reset,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    Event(&'a str),
    Command(Command),
    Unknown(&'a str),
    BadCycle(DurationParseError),
}

pub const HELP: &str = "\
/stop          suspend new predictions
/resume        resume predictions
/forcestop     stop, drop the pending prediction and forget used targets
/clearverif    drop the pending prediction
/pausecycle    show the pause cycle
/pausecycle 3,5,4   replace it (bare numbers are minutes; s, m, h suffixes)
/predictinfo   engine state
/bilan         statistics
/reset         zero statistics and used targets
/quit          exit";

#[must_use]
pub fn parse_line(line: &str) -> Line<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Line::Event(line);
    };
    let (name, args) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, args)| (name, args.trim()));

    let command = match name.to_ascii_lowercase().as_str() {
        "stop" => Command::Stop,
        "resume" | "start" => Command::Resume,
        "forcestop" => Command::ForceStop,
        "clearverif" => Command::ClearVerification,
        "pausecycle" if args.is_empty() => Command::PauseCycle(None),
        "pausecycle" => match parse_duration_list(args) {
            Ok(cycle) => Command::PauseCycle(Some(cycle)),
            Err(e) => return Line::BadCycle(e),
        },
        "predictinfo" | "status" => Command::Inspect,
        "bilan" | "stats" => Command::Stats,
        "reset" => Command::Reset,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Line::Unknown(name),
    };
    Line::Command(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mins(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|m| Duration::from_secs(m * 60)).collect()
    }

    #[test]
    fn plain_text_is_an_event() {
        assert_eq!(parse_line("  #N101 ✅ 8(A♥) "), Line::Event("#N101 ✅ 8(A♥)"));
        assert_eq!(parse_line("   "), Line::Blank);
    }

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(parse_line("/STOP"), Line::Command(Command::Stop));
        assert_eq!(parse_line("/forceStop"), Line::Command(Command::ForceStop));
        assert_eq!(parse_line("/clearverif"), Line::Command(Command::ClearVerification));
        assert_eq!(parse_line("/bilan"), Line::Command(Command::Stats));
        assert_eq!(parse_line("/predictinfo"), Line::Command(Command::Inspect));
    }

    #[test]
    fn pause_cycle_with_and_without_arguments() {
        assert_eq!(parse_line("/pausecycle"), Line::Command(Command::PauseCycle(None)));
        assert_eq!(
            parse_line("/pausecycle 3,5,4"),
            Line::Command(Command::PauseCycle(Some(mins(&[3, 5, 4]))))
        );
        assert_eq!(
            parse_line("/pausecycle 90s 2m"),
            Line::Command(Command::PauseCycle(Some(vec![
                Duration::from_secs(90),
                Duration::from_secs(120)
            ])))
        );
        assert!(matches!(parse_line("/pausecycle 3,abc"), Line::BadCycle(_)));
        assert!(matches!(parse_line("/pausecycle 0"), Line::BadCycle(_)));
    }

    #[test]
    fn unknown_command_is_reported() {
        assert_eq!(parse_line("/vip 12"), Line::Unknown("vip"));
    }
}
