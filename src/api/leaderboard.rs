// {{{ Imports
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::context::{BotContext, TaggedError};
use crate::pogo::faction::Faction;
use crate::pogo::stats::Stat;

use super::{api_token, api_url, faction_from_wire};
// }}}

// {{{ Scope
/// Which population a board is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
	Global,
	Guild(u64),
}

impl Scope {
	fn endpoint(self, base: &str, stat: Stat) -> String {
		match self {
			Scope::Global => format!("{base}/leaderboard/{}/", stat.api_name()),
			Scope::Guild(guild_id) => {
				format!("{base}/leaderboard/discord/{guild_id}/{}/", stat.api_name())
			}
		}
	}
}
// }}}
// {{{ Wire types
#[derive(Deserialize)]
struct RawAggregations {
	count: u64,
	#[serde(default)]
	min: f64,
	#[serde(default)]
	max: f64,
	#[serde(default)]
	avg: f64,
	#[serde(default)]
	sum: f64,
}

#[derive(Deserialize)]
struct RawEntry {
	position: u32,
	username: String,
	#[serde(default)]
	faction: Option<u8>,
	value: f64,
	last_updated: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawLeaderboard {
	aggregations: RawAggregations,
	leaderboard: Vec<RawEntry>,
}

#[derive(Deserialize)]
struct RawGainsEntry {
	position: u32,
	username: String,
	#[serde(default)]
	faction: Option<u8>,
	#[serde(default)]
	start_value: Option<f64>,
	end_value: f64,
}

#[derive(Deserialize)]
struct RawGainsLeaderboard {
	leaderboard: Vec<RawGainsEntry>,
}
// }}}
// {{{ Domain types
/// Server-side summary statistics over the whole (unpaged) board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregations {
	pub count: u64,
	pub min: f64,
	pub max: f64,
	pub avg: f64,
	pub sum: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
	pub position: u32,
	pub username: String,
	pub faction: Option<Faction>,
	pub value: f64,
	pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
	pub aggregations: Aggregations,
	pub entries: Vec<LeaderboardEntry>,
}

/// One line of a gains board. `start` is missing for trainers whose
/// first ever snapshot falls inside the window.
#[derive(Debug, Clone, PartialEq)]
pub struct GainsEntry {
	pub position: u32,
	pub username: String,
	pub faction: Option<Faction>,
	pub start: Option<f64>,
	pub end: f64,
}

impl GainsEntry {
	#[inline]
	pub fn delta(&self) -> Option<f64> {
		self.start.map(|start| self.end - start)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct GainsLeaderboard {
	pub entries: Vec<GainsEntry>,
}
// }}}
// {{{ Fetch leaderboard
pub async fn get_leaderboard(
	ctx: &BotContext,
	stat: Stat,
	scope: Scope,
) -> Result<Leaderboard, TaggedError> {
	let url = api_url()?;
	let token = api_token()?;

	let raw = ctx
		.http_client
		.get(scope.endpoint(&url, stat))
		.header("Authorization", format!("Token {token}"))
		.send()
		.await
		.context("Failed to send request")?
		.error_for_status()
		.context("Request has non-ok status")?
		.json::<RawLeaderboard>()
		.await
		.context("Failed to decode response")?;

	let entries = raw
		.leaderboard
		.into_iter()
		.map(|entry| {
			Ok(LeaderboardEntry {
				position: entry.position,
				username: entry.username,
				faction: faction_from_wire(entry.faction)?,
				value: entry.value,
				last_updated: entry.last_updated,
			})
		})
		.collect::<Result<Vec<_>, TaggedError>>()?;

	Ok(Leaderboard {
		aggregations: Aggregations {
			count: raw.aggregations.count,
			min: raw.aggregations.min,
			max: raw.aggregations.max,
			avg: raw.aggregations.avg,
			sum: raw.aggregations.sum,
		},
		entries,
	})
}
// }}}
// {{{ Fetch gains leaderboard
/// The server aggregates per-trainer deltas between the two instants;
/// we only render what comes back.
pub async fn get_gains_leaderboard(
	ctx: &BotContext,
	stat: Stat,
	scope: Scope,
	window: (DateTime<Utc>, DateTime<Utc>),
) -> Result<GainsLeaderboard, TaggedError> {
	let url = api_url()?;
	let token = api_token()?;

	let raw = ctx
		.http_client
		.get(scope.endpoint(&url, stat))
		.query(&[
			("mode", "gains".to_owned()),
			("subtrahend_datetime", window.0.to_rfc3339()),
			("minuend_datetime", window.1.to_rfc3339()),
		])
		.header("Authorization", format!("Token {token}"))
		.send()
		.await
		.context("Failed to send request")?
		.error_for_status()
		.context("Request has non-ok status")?
		.json::<RawGainsLeaderboard>()
		.await
		.context("Failed to decode response")?;

	let entries = raw
		.leaderboard
		.into_iter()
		.map(|entry| {
			Ok(GainsEntry {
				position: entry.position,
				username: entry.username,
				faction: faction_from_wire(entry.faction)?,
				start: entry.start_value,
				end: entry.end_value,
			})
		})
		.collect::<Result<Vec<_>, TaggedError>>()?;

	Ok(GainsLeaderboard { entries })
}
// }}}
