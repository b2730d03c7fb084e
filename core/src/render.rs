//! Outbound message text.

use std::fmt::Write as _;
use std::time::Duration;

use croupier_types::{GameNumber, Outcome, Suit};
use croupier_utils::format_duration;

use crate::engine::EngineSnapshot;
use crate::stats::Tally;

fn header(target: GameNumber, suit: Suit) -> String {
    format!(
        "🎰 **PRÉDICTION #{}**\n🎯 Couleur: {}",
        target.get(),
        suit.display_name()
    )
}

#[must_use]
pub fn prediction_text(target: GameNumber, suit: Suit) -> String {
    format!("{}\n⏳ Statut: EN ATTENTE DU RÉSULTAT...", header(target, suit))
}

/// The published prediction with its status line replaced by the outcome.
#[must_use]
pub fn resolved_text(target: GameNumber, suit: Suit, outcome: Outcome) -> String {
    let status = match outcome {
        Outcome::Won(_) => format!("{} GAGNÉ", outcome.badge()),
        Outcome::Lost => format!("{} PERDU", outcome.badge()),
    };
    format!("{}\n📊 Statut: {status}", header(target, suit))
}

/// Whole minutes, rounded down.
#[must_use]
pub fn pause_text(duration: Duration) -> String {
    format!("⏸️ **PAUSE**\n⏱️ {} minutes...", duration.as_secs() / 60)
}

#[must_use]
pub fn stats_text(tally: &Tally, max_offset: u8) -> String {
    let mut out = String::from("📊 **BILAN**\n");
    let _ = writeln!(out, "Total: {}", tally.total);
    let _ = writeln!(out, "✅ Gagnés: {}", tally.wins);
    let _ = writeln!(out, "❌ Perdus: {}", tally.losses);
    for offset in 0..=max_offset {
        let _ = writeln!(
            out,
            "   {}: {}",
            Outcome::Won(offset).badge(),
            tally.wins_at(offset)
        );
    }
    match tally.win_rate() {
        Some(rate) => {
            let _ = write!(out, "Taux de réussite: {rate:.1}%");
        }
        None => out.push_str("Taux de réussite: -"),
    }
    out
}

#[must_use]
pub fn snapshot_text(snapshot: &EngineSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Prédictions: {}",
        if snapshot.enabled { "ON" } else { "OFF" }
    );
    match &snapshot.slot {
        Some(slot) => {
            let _ = writeln!(
                out,
                "En cours: #{} {} (check {}/{}, attendu #{})",
                slot.target.get(),
                slot.suit,
                slot.check_offset,
                snapshot.max_offset,
                slot.expected.get()
            );
        }
        None => out.push_str("En cours: aucune\n"),
    }
    if let Some(target) = snapshot.launch_outstanding {
        let _ = writeln!(out, "Publication en cours: #{}", target.get());
    }
    let pause = &snapshot.pause;
    match pause.remaining {
        Some(left) => {
            let _ = writeln!(out, "Pause: oui ({} restantes)", format_duration(left));
        }
        None => out.push_str("Pause: non\n"),
    }
    let _ = writeln!(
        out,
        "Compteur: {}/{}",
        pause.predictions_since_reset, pause.threshold
    );
    let cycle: Vec<String> = pause.cycle.iter().map(|d| format_duration(*d)).collect();
    let upcoming: Vec<String> = pause.upcoming.iter().map(|d| format_duration(*d)).collect();
    let _ = writeln!(out, "Cycle: {}", cycle.join(", "));
    let _ = writeln!(out, "Prochaines pauses: {}", upcoming.join(", "));
    let _ = writeln!(
        out,
        "Dernier numéro: {}",
        snapshot
            .last_seen
            .map_or_else(|| "-".to_string(), |n| format!("#{}", n.get()))
    );
    let _ = write!(out, "Cibles utilisées: {}", snapshot.targeted_count);
    out
}
