// {{{ Imports
use crate::api::leaderboard::LeaderboardEntry;
use crate::pogo::faction::Faction;
// }}}

/// Entries shown per page on standard boards.
pub const PAGE_SIZE: usize = 15;

/// Gains lines are wider, so fewer of them fit on a page.
pub const GAINS_PAGE_SIZE: usize = 10;

// {{{ Paging
#[inline]
pub fn page_count(entries: usize, page_size: usize) -> usize {
	entries.div_ceil(page_size)
}

/// Slices a rank-ordered leaderboard into fixed-size pages, keeping
/// the server's ordering and covering every entry exactly once.
pub fn pages<T>(entries: &[T], page_size: usize) -> Vec<&[T]> {
	entries.chunks(page_size).collect()
}
// }}}
// {{{ Post-filters
/// Client-side filter applied after the fetch. Entries without a
/// faction count as teamless.
pub fn filter_by_faction(
	entries: Vec<LeaderboardEntry>,
	faction: Option<Faction>,
) -> Vec<LeaderboardEntry> {
	match faction {
		None => entries,
		Some(faction) => entries
			.into_iter()
			.filter(|entry| entry.faction.unwrap_or(Faction::Teamless) == faction)
			.collect(),
	}
}
// }}}
// {{{ Tests
#[cfg(test)]
mod paging_tests {
	use chrono::{TimeZone, Utc};

	use super::*;

	#[test]
	fn every_entry_appears_exactly_once() {
		for len in 0..100 {
			for page_size in [1, 7, 10, 15] {
				let entries: Vec<u32> = (0..len).collect();
				let pages = pages(&entries, page_size);

				assert_eq!(pages.len(), page_count(entries.len(), page_size));
				assert_eq!(
					entries,
					pages.concat(),
					"paging {len} entries with page size {page_size}"
				);
			}
		}
	}

	#[test]
	fn full_pages_come_first() {
		let entries: Vec<u32> = (0..32).collect();
		let pages = pages(&entries, 15);

		assert_eq!(pages.len(), 3);
		assert_eq!(pages[0].len(), 15);
		assert_eq!(pages[1].len(), 15);
		assert_eq!(pages[2].len(), 2);
	}

	fn entry(position: u32, faction: Option<Faction>) -> LeaderboardEntry {
		LeaderboardEntry {
			position,
			username: format!("trainer{position}"),
			faction,
			value: position as f64,
			last_updated: Utc.with_ymd_and_hms(2024, 9, 2, 12, 0, 0).unwrap(),
		}
	}

	#[test]
	fn faction_filter_keeps_server_order() {
		let entries = vec![
			entry(1, Some(Faction::Mystic)),
			entry(2, Some(Faction::Valor)),
			entry(3, Some(Faction::Mystic)),
			entry(4, None),
		];

		let filtered = filter_by_faction(entries.clone(), Some(Faction::Mystic));
		assert_eq!(
			vec![1, 3],
			filtered.iter().map(|e| e.position).collect::<Vec<_>>()
		);

		// a missing faction counts as teamless
		let teamless = filter_by_faction(entries.clone(), Some(Faction::Teamless));
		assert_eq!(
			vec![4],
			teamless.iter().map(|e| e.position).collect::<Vec<_>>()
		);

		assert_eq!(entries, filter_by_faction(entries.clone(), None));
	}
}
// }}}
