// {{{ Imports
use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::api::trainer::Update;
use crate::pogo::deadline::last_deadline;
use crate::pogo::stats::Stat;
// }}}

/// Date the game went live; anchors synthetic baselines for trainers
/// with no known start date.
pub fn game_launch() -> NaiveDate {
	NaiveDate::from_ymd_opt(2016, 7, 6).unwrap()
}

// {{{ Update selection
/// The "latest" update is the one with the highest total XP, not the
/// most recent timestamp; recency only breaks ties.
pub fn latest_update(updates: &[Update]) -> Option<&Update> {
	updates.iter().max_by_key(|u| (u.total_xp, u.update_time))
}

/// The update progress is measured against: the highest-XP snapshot
/// taken strictly before the deadline preceding `current`.
pub fn comparison_update<'a>(
	updates: &'a [Update],
	current: &Update,
	tz: Tz,
) -> Option<&'a Update> {
	let deadline = last_deadline(current.update_time, tz);

	updates
		.iter()
		.filter(|u| u.update_time < deadline && u.uuid != current.uuid)
		.max_by_key(|u| (u.total_xp, u.update_time))
}
// }}}
// {{{ Diff lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffLine {
	pub stat: Stat,
	pub now: f64,
	pub then: Option<f64>,
	/// Elapsed days between the two snapshots, floored to one so
	/// same-day comparisons don't blow up the daily rate.
	pub days: i64,
}

impl DiffLine {
	#[inline]
	pub fn delta(self) -> Option<f64> {
		self.then.map(|then| self.now - then)
	}

	#[inline]
	pub fn rate_per_day(self) -> Option<f64> {
		self.delta().map(|delta| delta / self.days.max(1) as f64)
	}

	pub fn render(self) -> String {
		match (self.then, self.delta(), self.rate_per_day()) {
			(Some(then), Some(delta), Some(rate)) => format!(
				"{} ⇒ {} ({} | {}/day)",
				self.stat.format_value(then),
				self.stat.format_value(self.now),
				self.stat.format_delta(delta),
				self.stat.format_delta(rate),
			),
			_ => self.stat.format_value(self.now),
		}
	}
}
// }}}
// {{{ Progress
#[derive(Debug, Clone)]
pub struct Progress {
	pub lines: Vec<DiffLine>,
	/// Set when no snapshot from before the deadline existed and the
	/// diff had to be measured from a synthetic zero baseline.
	pub approximated: bool,
}

fn diff_lines(current: &Update, comparison: &Update) -> Vec<DiffLine> {
	let days = (current.update_time - comparison.update_time)
		.num_days()
		.max(1);

	Stat::STATS
		.iter()
		.filter_map(|&stat| {
			let now = current.stat(stat)?;
			Some(DiffLine {
				stat,
				now,
				then: comparison.stat(stat),
				days,
			})
		})
		.collect()
}

/// Builds the "progress since last deadline" section of a profile
/// card. Falls back to an all-zero update anchored at the trainer's
/// registration date (or the game's launch) when no genuine
/// comparison exists.
pub fn progress(
	updates: &[Update],
	current: &Update,
	start_date: Option<NaiveDate>,
	tz: Tz,
) -> Progress {
	match comparison_update(updates, current, tz) {
		Some(comparison) => Progress {
			lines: diff_lines(current, comparison),
			approximated: false,
		},
		None => {
			let anchor = start_date
				.unwrap_or_else(game_launch)
				.and_hms_opt(0, 0, 0)
				.unwrap()
				.and_utc();
			let baseline = Update::zero_at(anchor, current.trainer_id);

			Progress {
				lines: diff_lines(current, &baseline),
				approximated: true,
			}
		}
	}
}
// }}}
// {{{ Monotonicity guard
/// An update is only worth posting when at least one submitted stat
/// strictly exceeds its stored counterpart; missing stored values
/// satisfy the guard vacuously.
pub fn warrants_update(latest: Option<&Update>, submitted: &[(Stat, f64)]) -> bool {
	let Some(latest) = latest else {
		return !submitted.is_empty();
	};

	submitted
		.iter()
		.any(|&(stat, value)| match latest.stat(stat) {
			Some(stored) => value > stored,
			None => true,
		})
}
// }}}
// {{{ Tests
#[cfg(test)]
mod progress_tests {
	use chrono::{DateTime, TimeZone, Utc};
	use chrono_tz::Tz;

	use super::*;

	fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
	}

	fn update(uuid: &str, time: DateTime<Utc>, total_xp: Option<u64>) -> Update {
		Update {
			uuid: uuid.to_owned(),
			trainer_id: 1,
			update_time: time,
			total_xp,
			travel_km: None,
			capture_total: None,
			pokestops_visited: None,
			gym_gold: None,
			data_source: None,
		}
	}

	#[test]
	fn latest_means_highest_xp_not_most_recent() {
		let updates = vec![
			update("a", at(2024, 9, 3, 10), Some(2_000_000)),
			update("b", at(2024, 9, 4, 10), Some(1_500_000)),
		];

		assert_eq!(latest_update(&updates).unwrap().uuid, "a");
	}

	#[test]
	fn comparison_ignores_snapshots_from_the_current_week() {
		// current is Wednesday; the Tuesday snapshot is inside the
		// same week, the Sunday one is not
		let current = update("c", at(2024, 9, 4, 10), Some(3_000_000));
		let updates = vec![
			update("a", at(2024, 9, 1, 10), Some(1_000_000)),
			update("b", at(2024, 9, 3, 10), Some(2_000_000)),
			current.clone(),
		];

		let comparison = comparison_update(&updates, &current, Tz::UTC).unwrap();
		assert_eq!(comparison.uuid, "a");
	}

	#[test]
	fn missing_comparison_falls_back_to_a_zero_baseline() {
		let current = update("a", at(2024, 9, 4, 10), Some(3_000_000));
		let updates = vec![current.clone()];

		let progress = progress(
			&updates,
			&current,
			Some(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()),
			Tz::UTC,
		);

		assert!(progress.approximated);
		let xp = &progress.lines[0];
		assert_eq!(xp.then, Some(0.0));
		assert_eq!(xp.days, 34);
	}

	#[test]
	fn same_day_rates_divide_by_one() {
		let line = DiffLine {
			stat: Stat::TotalXp,
			now: 1_000.0,
			then: Some(400.0),
			days: 0,
		};

		assert_eq!(line.rate_per_day(), Some(600.0));
	}

	#[test]
	fn diff_lines_render_before_and_after() {
		let line = DiffLine {
			stat: Stat::TotalXp,
			now: 123_456.0,
			then: Some(120_000.0),
			days: 7,
		};

		assert_eq!(
			line.render(),
			"120,000 ⇒ 123,456 (+3,456 | +494/day)"
		);

		let absolute = DiffLine {
			stat: Stat::CaptureTotal,
			now: 420.0,
			then: None,
			days: 7,
		};
		assert_eq!(absolute.render(), "420");
	}

	// {{{ Guard truth table
	#[test]
	fn guard_rejects_non_increasing_submissions() {
		let latest = update("a", at(2024, 9, 1, 0), Some(1_000));

		assert!(!warrants_update(
			Some(&latest),
			&[(Stat::TotalXp, 1_000.0)]
		));
		assert!(!warrants_update(Some(&latest), &[(Stat::TotalXp, 999.0)]));
		assert!(warrants_update(Some(&latest), &[(Stat::TotalXp, 1_001.0)]));
	}

	#[test]
	fn guard_passes_vacuously_for_unknown_stats() {
		let latest = update("a", at(2024, 9, 1, 0), Some(1_000));

		// travel_km was never recorded, so any value counts as new
		assert!(warrants_update(Some(&latest), &[(Stat::TravelKm, 0.5)]));
		assert!(warrants_update(None, &[(Stat::TotalXp, 1.0)]));
		assert!(!warrants_update(None, &[]));
	}

	#[test]
	fn one_increasing_stat_is_enough() {
		let mut latest = update("a", at(2024, 9, 1, 0), Some(1_000));
		latest.capture_total = Some(500);

		assert!(warrants_update(
			Some(&latest),
			&[(Stat::TotalXp, 900.0), (Stat::CaptureTotal, 501.0)]
		));
	}
	// }}}
}
// }}}
