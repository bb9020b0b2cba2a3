// {{{ Imports
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{CreateEmbed, CreateEmbedFooter};

use crate::api::leaderboard::{Aggregations, GainsEntry, LeaderboardEntry};
use crate::api::trainer::Trainer;
use crate::pogo::faction::Faction;
use crate::pogo::progress::Progress;
use crate::pogo::stats::Stat;
// }}}

/// Shown at the bottom of profile cards built from a synthetic zero
/// baseline.
pub const ACCURACY_DISCLAIMER: &str =
	"No update from before this week was found, so gains are measured from the account's registration.";

// {{{ Profile card
pub fn format_trainer_code(code: &str) -> String {
	code.as_bytes()
		.chunks(4)
		.map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
		.collect::<Vec<_>>()
		.join(" ")
}

/// Composes a profile card from a trainer, their progress diff, and
/// any leaderboard ranks the enrichment step managed to fetch.
pub fn profile_embed(
	trainer: &Trainer,
	progress: &Progress,
	ranks: &[(Stat, String)],
) -> CreateEmbed {
	let mut embed = CreateEmbed::default()
		.title(format!("{} {}", trainer.faction.emoji(), trainer.username))
		.color(trainer.faction.color());

	for (stat, rank) in ranks {
		embed = embed.field(format!("{stat} rank"), rank.clone(), true);
	}

	for line in &progress.lines {
		embed = embed.field(line.stat.to_string(), line.render(), false);
	}

	if let Some(start_date) = trainer.start_date {
		embed = embed.field("Trainer since", start_date.format("%Y-%m-%d").to_string(), true);
	}

	if let Some(code) = &trainer.trainer_code {
		embed = embed.field("Trainer code", format_trainer_code(code), true);
	}

	if progress.approximated {
		embed = embed.footer(CreateEmbedFooter::new(ACCURACY_DISCLAIMER));
	}

	embed
}
// }}}
// {{{ Leaderboard pages
fn faction_emoji(faction: Option<Faction>) -> &'static str {
	faction.unwrap_or(Faction::Teamless).emoji()
}

pub fn leaderboard_entry_line(stat: Stat, entry: &LeaderboardEntry) -> String {
	format!(
		"**#{}** {} {} — {} ({})",
		entry.position,
		faction_emoji(entry.faction),
		entry.username,
		stat.format_value(entry.value),
		entry.last_updated.format("%Y-%m-%d"),
	)
}

pub fn no_results_message(stat: Stat) -> String {
	format!("No trainers are ranked on the {stat} leaderboard (after filtering).")
}

pub fn leaderboard_page_embed(
	stat: Stat,
	scope_label: &str,
	aggregations: &Aggregations,
	page: &[LeaderboardEntry],
	page_index: usize,
	page_count: usize,
) -> CreateEmbed {
	let lines = page
		.iter()
		.map(|entry| leaderboard_entry_line(stat, entry))
		.collect::<Vec<_>>()
		.join("\n");

	CreateEmbed::default()
		.title(format!("{stat} leaderboard — {scope_label}"))
		.description(lines)
		.field("Trainers", aggregations.count.to_string(), true)
		.field("Min", stat.format_value(aggregations.min), true)
		.field("Avg", stat.format_value(aggregations.avg), true)
		.field("Max", stat.format_value(aggregations.max), true)
		.field("Sum", stat.format_value(aggregations.sum), true)
		.footer(CreateEmbedFooter::new(format!(
			"Page {}/{}",
			page_index + 1,
			page_count
		)))
}
// }}}
// {{{ Gains
/// Entries with both snapshots show the full before/after diff;
/// first-time submissions inside the window get a distinct line.
pub fn gains_entry_line(stat: Stat, entry: &GainsEntry, days: i64) -> String {
	match (entry.start, entry.delta()) {
		(Some(start), Some(delta)) => {
			let rate = delta / days.max(1) as f64;
			format!(
				"**#{}** {} {}: {} ⇒ {} ({} | {}/day)",
				entry.position,
				faction_emoji(entry.faction),
				entry.username,
				stat.format_value(start),
				stat.format_value(entry.end),
				stat.format_delta(delta),
				stat.format_delta(rate),
			)
		}
		_ => format!(
			"**#{}** {} {}: {} *(new this week)*",
			entry.position,
			faction_emoji(entry.faction),
			entry.username,
			stat.format_value(entry.end),
		),
	}
}

/// Number of entries shown in the compact combined view.
pub const GAINS_SUMMARY_LEN: usize = 5;

pub fn gains_summary_embed(
	stat: Stat,
	entries: &[GainsEntry],
	window: (DateTime<Utc>, DateTime<Utc>),
) -> CreateEmbed {
	let days = (window.1 - window.0).num_days().max(1);
	let lines = entries
		.iter()
		.take(GAINS_SUMMARY_LEN)
		.map(|entry| gains_entry_line(stat, entry, days))
		.collect::<Vec<_>>()
		.join("\n");

	CreateEmbed::default()
		.title(format!("Weekly {stat} gains"))
		.description(if lines.is_empty() {
			"Nobody submitted an update this week.".to_owned()
		} else {
			lines
		})
		.footer(CreateEmbedFooter::new(
			"Full standings are posted in the thread below.",
		))
}

pub fn gains_page_embed(
	stat: Stat,
	page: &[GainsEntry],
	page_index: usize,
	page_count: usize,
	days: i64,
) -> CreateEmbed {
	let lines = page
		.iter()
		.map(|entry| gains_entry_line(stat, entry, days))
		.collect::<Vec<_>>()
		.join("\n");

	CreateEmbed::default()
		.title(format!("Weekly {stat} gains"))
		.description(lines)
		.footer(CreateEmbedFooter::new(format!(
			"Page {}/{}",
			page_index + 1,
			page_count
		)))
}
// }}}
// {{{ Tests
#[cfg(test)]
mod embed_tests {
	use chrono::TimeZone;

	use crate::pogo::progress::DiffLine;

	use super::*;

	#[test]
	fn trainer_codes_group_in_fours() {
		assert_eq!(format_trainer_code("123456789012"), "1234 5678 9012");
	}

	#[test]
	fn leaderboard_lines_show_rank_faction_value_and_date() {
		let entry = LeaderboardEntry {
			position: 3,
			username: "Ash".to_owned(),
			faction: Some(Faction::Valor),
			value: 25_000_000.0,
			last_updated: Utc.with_ymd_and_hms(2024, 9, 2, 12, 0, 0).unwrap(),
		};

		assert_eq!(
			leaderboard_entry_line(Stat::TotalXp, &entry),
			"**#3** 🔴 Ash — 25,000,000 (2024-09-02)"
		);

		// a missing faction falls back to the teamless icon
		let teamless = LeaderboardEntry {
			faction: None,
			..entry
		};
		assert!(leaderboard_entry_line(Stat::TotalXp, &teamless).contains("⚪"));
	}

	#[test]
	fn gains_lines_distinguish_new_entries() {
		let full = GainsEntry {
			position: 1,
			username: "Misty".to_owned(),
			faction: Some(Faction::Mystic),
			start: Some(1_000_000.0),
			end: 1_070_000.0,
		};
		assert_eq!(
			gains_entry_line(Stat::TotalXp, &full, 7),
			"**#1** 🔵 Misty: 1,000,000 ⇒ 1,070,000 (+70,000 | +10,000/day)"
		);

		let fresh = GainsEntry {
			start: None,
			..full
		};
		assert_eq!(
			gains_entry_line(Stat::TotalXp, &fresh, 7),
			"**#1** 🔵 Misty: 1,070,000 *(new this week)*"
		);
	}

	// Embed builders are opaque; peeking at their wire form is the
	// closest thing to inspecting them.
	fn to_json(embed: &CreateEmbed) -> serde_json::Value {
		serde_json::to_value(embed).unwrap()
	}

	#[test]
	fn approximated_profiles_carry_the_disclaimer() {
		let trainer = Trainer {
			id: 1,
			owner_id: 1,
			username: "Ash".to_owned(),
			faction: Faction::Valor,
			start_date: None,
			trainer_code: None,
			verified: true,
			statistics_visible: true,
			last_modified: Utc.with_ymd_and_hms(2024, 9, 2, 12, 0, 0).unwrap(),
		};

		let approximated = Progress {
			lines: vec![DiffLine {
				stat: Stat::TotalXp,
				now: 100.0,
				then: Some(0.0),
				days: 30,
			}],
			approximated: true,
		};

		let json = to_json(&profile_embed(&trainer, &approximated, &[]));
		assert_eq!(json["footer"]["text"], ACCURACY_DISCLAIMER);

		let exact = Progress {
			approximated: false,
			..approximated
		};
		let json = to_json(&profile_embed(&trainer, &exact, &[]));
		assert!(json.get("footer").is_none() || json["footer"].is_null());
	}

	#[test]
	fn rank_fields_lead_the_profile_card() {
		let trainer = Trainer {
			id: 1,
			owner_id: 1,
			username: "Ash".to_owned(),
			faction: Faction::Instinct,
			start_date: None,
			trainer_code: None,
			verified: true,
			statistics_visible: true,
			last_modified: Utc.with_ymd_and_hms(2024, 9, 2, 12, 0, 0).unwrap(),
		};
		let progress = Progress {
			lines: vec![DiffLine {
				stat: Stat::TotalXp,
				now: 100.0,
				then: None,
				days: 1,
			}],
			approximated: false,
		};

		let embed = profile_embed(
			&trainer,
			&progress,
			&[(Stat::TotalXp, "Global #12 · Server #3".to_owned())],
		);
		let json = to_json(&embed);

		assert_eq!(json["fields"][0]["name"], "Total XP rank");
		assert_eq!(json["fields"][0]["value"], "Global #12 · Server #3");
		assert_eq!(json["fields"][1]["name"], "Total XP");
	}
}
// }}}
