//! Weekly deadline boundary math.
//!
//! Progress diffs and the gains leaderboard both measure against the
//! most recent Monday noon in a guild's local timezone. Everything in
//! here is pure — no clock reads, no network.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Local hour at which the weekly deadline falls.
const DEADLINE_HOUR: u32 = 12;

// {{{ Deadline computation
fn monday_noon(monday: NaiveDate, tz: Tz) -> DateTime<Utc> {
	let noon = monday.and_time(NaiveTime::from_hms_opt(DEADLINE_HOUR, 0, 0).unwrap());

	match tz.from_local_datetime(&noon) {
		LocalResult::Single(t) => t.with_timezone(&Utc),
		LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
		// Noon can only land inside a DST gap on exotic offsets; take
		// the first representable instant after it.
		LocalResult::None => {
			let mut t = noon;
			loop {
				t = t + Duration::hours(1);
				if let Some(resolved) = tz.from_local_datetime(&t).earliest() {
					break resolved.with_timezone(&Utc);
				}
			}
		}
	}
}

/// The most recent Monday noon (in the given timezone) at or before
/// `now`. Deadlines never look into the future: on a Monday morning
/// this returns the *previous* week's boundary.
pub fn last_deadline(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
	let local = now.with_timezone(&tz);
	let monday =
		local.date_naive() - Duration::days(local.weekday().num_days_from_monday() as i64);

	let candidate = monday_noon(monday, tz);
	if candidate <= now {
		candidate
	} else {
		monday_noon(monday - Duration::days(7), tz)
	}
}

/// Always exactly one week after [last_deadline].
pub fn next_deadline(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
	last_deadline(now, tz) + Duration::weeks(1)
}
// }}}
// {{{ Tests
#[cfg(test)]
mod deadline_tests {
	use chrono_tz::Tz;

	use super::*;

	fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
	}

	#[test]
	fn tuesday_afternoon_uses_the_preceding_monday() {
		// 2024-09-03 is a Tuesday
		let now = utc(2024, 9, 3, 15, 0);
		assert_eq!(last_deadline(now, Tz::UTC), utc(2024, 9, 2, 12, 0));
	}

	#[test]
	fn monday_morning_uses_the_previous_week() {
		// 2024-09-02 is a Monday
		let now = utc(2024, 9, 2, 11, 0);
		assert_eq!(last_deadline(now, Tz::UTC), utc(2024, 8, 26, 12, 0));
	}

	#[test]
	fn the_boundary_itself_counts() {
		let now = utc(2024, 9, 2, 12, 0);
		assert_eq!(last_deadline(now, Tz::UTC), now);
	}

	#[test]
	fn respects_the_local_timezone() {
		// Monday noon in New York is 16:00 UTC during DST
		let now = utc(2024, 9, 2, 17, 0);
		let tz: Tz = "America/New_York".parse().unwrap();
		assert_eq!(last_deadline(now, tz), utc(2024, 9, 2, 16, 0));

		// ...so at 15:00 UTC the local deadline hasn't passed yet
		let now = utc(2024, 9, 2, 15, 0);
		assert_eq!(last_deadline(now, tz), utc(2024, 8, 26, 16, 0));
	}

	#[test]
	fn invariants_hold_across_a_fortnight() {
		for hour in 0..(24 * 14) {
			let now = utc(2024, 9, 1, 0, 30) + Duration::hours(hour);
			let last = last_deadline(now, Tz::UTC);

			assert!(last <= now);
			assert!(now < last + Duration::weeks(1));
			assert_eq!(last_deadline(last, Tz::UTC), last);
			assert_eq!(next_deadline(now, Tz::UTC), last + Duration::weeks(1));
		}
	}
}
// }}}
