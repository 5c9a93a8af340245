//! Plain-text rendering of pairs, leaderboards and summaries for the terminal

use crate::types::{EntityRecord, MatchOutcome};
use std::fmt::Write;

/// Heading line for one side of a presented pair, e.g. `Pikachu (#25)`
pub fn format_heading(record: &EntityRecord) -> String {
    format!("{} (#{})", record.name(), record.metadata.pokedex_number)
}

/// Card for one entity of a pair: heading, generation, region and types
pub fn format_entity(label: &str, record: &EntityRecord) -> String {
    let meta = &record.metadata;
    format!(
        "[{}] {}\n    Generation: {}\n    Region: {}\n    Type: {}\n",
        label,
        format_heading(record),
        meta.generation,
        meta.region,
        meta.types.join(", ")
    )
}

/// The two sides of a comparison as presented to the operator
pub fn format_pair(a: &EntityRecord, b: &EntityRecord) -> String {
    let mut out = format_entity("1", a);
    out.push_str("        vs\n");
    out.push_str(&format_entity("2", b));
    out
}

/// Leaderboard table, one row per record in the order given
pub fn format_leaderboard(records: &[&EntityRecord]) -> String {
    let name_width = records
        .iter()
        .map(|r| r.name().chars().count())
        .max()
        .unwrap_or(0)
        .max("Name".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<name_width$}  {:>5}  {:>4}  {:>6}  {:<18}  {:<16}  {:<8}  {:>7}",
        "Rank", "Name", "Elo", "Wins", "Losses", "Types", "Generation", "Region", "Pokedex",
    );

    for (idx, record) in records.iter().enumerate() {
        let meta = &record.metadata;
        let _ = writeln!(
            out,
            "{:>4}  {:<name_width$}  {:>5}  {:>4}  {:>6}  {:<18}  {:<16}  {:<8}  {:>7}",
            idx + 1,
            record.name(),
            // Integer part only, matching the legacy leaderboard
            record.rating().trunc() as i64,
            record.wins(),
            record.losses(),
            meta.types.join(", "),
            meta.generation,
            meta.region,
            meta.pokedex_number,
        );
    }

    out
}

/// Detail cards for the best entities: dex number, size, abilities and base stats
pub fn format_top_cards(records: &[&EntityRecord]) -> String {
    let mut out = String::new();

    for (idx, record) in records.iter().enumerate() {
        let meta = &record.metadata;
        let _ = writeln!(
            out,
            "{}. #{} {}  ({:.0}, {}W/{}L)",
            idx + 1,
            meta.pokedex_number,
            record.name(),
            record.rating(),
            record.wins(),
            record.losses()
        );
        let _ = writeln!(out, "   Height: {} m | Weight: {} kg", meta.height, meta.weight);
        let _ = writeln!(out, "   Abilities: {}", meta.abilities.join(", "));
        if !meta.stats.is_empty() {
            let stats: Vec<String> = meta
                .stats
                .iter()
                .map(|(stat, value)| format!("{} {}", stat, value))
                .collect();
            let _ = writeln!(out, "   Stats: {}", stats.join(" | "));
        }
    }

    out
}

/// One-line summary of a recorded match
pub fn format_outcome(outcome: &MatchOutcome) -> String {
    format!(
        "{} {:.1} -> {:.1} ({:+.1}), {} {:.1} -> {:.1} ({:+.1})",
        outcome.winner.entity_id,
        outcome.winner.old_rating,
        outcome.winner.new_rating,
        outcome.winner.delta(),
        outcome.loser.entity_id,
        outcome.loser.old_rating,
        outcome.loser.new_rating,
        outcome.loser.delta()
    )
}

/// Totals shown at the end of a voting session
pub fn format_vote_summary(entities: usize, total_votes: u64, session_votes: u64) -> String {
    format!(
        "{} entities ranked, {} votes cast ({} this session)",
        entities, total_votes, session_votes
    )
}

/// Totals for the stored rankings, outside of any voting session
pub fn format_store_summary(entities: usize, total_votes: u64) -> String {
    format!("{} entities ranked, {} votes cast", entities, total_votes)
}
