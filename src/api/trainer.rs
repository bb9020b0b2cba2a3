// {{{ Imports
use anyhow::{anyhow, Context};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::context::{BotContext, ErrorKind, TagError, TaggedError};
use crate::pogo::faction::Faction;
use crate::pogo::stats::Stat;

use super::{api_token, api_url, faction_from_wire};
// }}}

// {{{ Data sources
/// Markers the remote service uses to attribute where an update came
/// from.
pub const SOURCE_COMMAND: &str = "ts_social_discord";
pub const SOURCE_APPROVAL: &str = "cs_social_discord";
pub const SOURCE_OCR: &str = "ss_ocr";
// }}}
// {{{ Wire types
#[derive(Deserialize)]
struct RawTrainer {
	id: u64,
	owner: u64,
	username: String,
	#[serde(default)]
	faction: Option<u8>,
	#[serde(default)]
	start_date: Option<NaiveDate>,
	#[serde(default)]
	trainer_code: Option<String>,
	#[serde(default)]
	verified: bool,
	#[serde(default = "yes")]
	statistics_visible: bool,
	last_modified: DateTime<Utc>,
}

fn yes() -> bool {
	true
}

#[derive(Deserialize)]
struct RawUpdate {
	uuid: String,
	trainer: u64,
	update_time: DateTime<Utc>,
	#[serde(default)]
	total_xp: Option<u64>,
	#[serde(default)]
	travel_km: Option<f64>,
	#[serde(default)]
	capture_total: Option<u64>,
	#[serde(default)]
	pokestops_visited: Option<u64>,
	#[serde(default)]
	gymbadges_gold: Option<u64>,
	#[serde(default)]
	data_source: Option<String>,
}
// }}}
// {{{ Trainer
#[derive(Debug, Clone)]
pub struct Trainer {
	pub id: u64,
	pub owner_id: u64,
	pub username: String,
	pub faction: Faction,
	pub start_date: Option<NaiveDate>,
	pub trainer_code: Option<String>,
	pub verified: bool,
	pub statistics_visible: bool,
	pub last_modified: DateTime<Utc>,
}

impl Trainer {
	fn from_raw(raw: RawTrainer) -> Result<Self, TaggedError> {
		Ok(Self {
			id: raw.id,
			owner_id: raw.owner,
			username: raw.username,
			faction: faction_from_wire(raw.faction)?.unwrap_or(Faction::Teamless),
			start_date: raw.start_date,
			trainer_code: raw.trainer_code,
			verified: raw.verified,
			statistics_visible: raw.statistics_visible,
			last_modified: raw.last_modified,
		})
	}
}
// }}}
// {{{ Update
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
	pub uuid: String,
	pub trainer_id: u64,
	pub update_time: DateTime<Utc>,
	pub total_xp: Option<u64>,
	pub travel_km: Option<f64>,
	pub capture_total: Option<u64>,
	pub pokestops_visited: Option<u64>,
	pub gym_gold: Option<u64>,
	pub data_source: Option<String>,
}

impl Update {
	fn from_raw(raw: RawUpdate) -> Self {
		Self {
			uuid: raw.uuid,
			trainer_id: raw.trainer,
			update_time: raw.update_time,
			total_xp: raw.total_xp,
			travel_km: raw.travel_km,
			capture_total: raw.capture_total,
			pokestops_visited: raw.pokestops_visited,
			gym_gold: raw.gymbadges_gold,
			data_source: raw.data_source,
		}
	}

	pub fn stat(&self, stat: Stat) -> Option<f64> {
		match stat {
			Stat::TotalXp => self.total_xp.map(|v| v as f64),
			Stat::TravelKm => self.travel_km,
			Stat::CaptureTotal => self.capture_total.map(|v| v as f64),
			Stat::PokestopsVisited => self.pokestops_visited.map(|v| v as f64),
			Stat::GymGold => self.gym_gold.map(|v| v as f64),
		}
	}

	/// Synthetic all-zero update used as a comparison baseline when a
	/// trainer has no snapshot older than the deadline.
	pub fn zero_at(update_time: DateTime<Utc>, trainer_id: u64) -> Self {
		Self {
			uuid: String::new(),
			trainer_id,
			update_time,
			total_xp: Some(0),
			travel_km: Some(0.0),
			capture_total: Some(0),
			pokestops_visited: Some(0),
			gym_gold: Some(0),
			data_source: None,
		}
	}
}
// }}}
// {{{ New update payload
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct NewUpdate {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub total_xp: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub travel_km: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub capture_total: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pokestops_visited: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub gymbadges_gold: Option<u64>,
	pub data_source: Option<&'static str>,
}

impl NewUpdate {
	pub fn for_stat(stat: Stat, value: f64, data_source: &'static str) -> Self {
		Self {
			data_source: Some(data_source),
			..Self::default()
		}
		.with(stat, value)
	}

	pub fn with(mut self, stat: Stat, value: f64) -> Self {
		match stat {
			Stat::TotalXp => self.total_xp = Some(value.round() as u64),
			Stat::TravelKm => self.travel_km = Some(value),
			Stat::CaptureTotal => self.capture_total = Some(value.round() as u64),
			Stat::PokestopsVisited => self.pokestops_visited = Some(value.round() as u64),
			Stat::GymGold => self.gymbadges_gold = Some(value.round() as u64),
		}
		self
	}
}
// }}}
// {{{ Trainer edits
/// Partial edit proxied straight to the remote record.
#[derive(Serialize, Debug, Clone, Default)]
pub struct TrainerEdit {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub start_date: Option<NaiveDate>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub trainer_code: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub statistics_visible: Option<bool>,
}
// }}}
// {{{ Search trainers
pub async fn search_trainers(
	ctx: &BotContext,
	nickname: &str,
) -> Result<Vec<Trainer>, TaggedError> {
	let url = api_url()?;
	let token = api_token()?;

	let raw = ctx
		.http_client
		.get(format!("{url}/trainers/"))
		.query(&[("t", nickname)])
		.header("Authorization", format!("Token {token}"))
		.send()
		.await
		.context("Failed to send request")?
		.error_for_status()
		.context("Request has non-ok status")?
		.json::<Vec<RawTrainer>>()
		.await
		.context("Failed to decode response")?;

	raw.into_iter().map(Trainer::from_raw).collect()
}
// }}}
// {{{ Get trainer
pub async fn get_trainer(ctx: &BotContext, id: u64) -> Result<Trainer, TaggedError> {
	let url = api_url()?;
	let token = api_token()?;

	let response = ctx
		.http_client
		.get(format!("{url}/trainers/{id}/"))
		.header("Authorization", format!("Token {token}"))
		.send()
		.await
		.context("Failed to send request")?;

	if response.status() == reqwest::StatusCode::NOT_FOUND {
		return Err(anyhow!("No trainer with id {id} exists").tag(ErrorKind::User));
	}

	let raw = response
		.error_for_status()
		.context("Request has non-ok status")?
		.json::<RawTrainer>()
		.await
		.context("Failed to decode response")?;

	Trainer::from_raw(raw)
}
// }}}
// {{{ Create trainer
#[derive(Serialize)]
struct CreateTrainer<'a> {
	username: &'a str,
	faction: u8,
	verified: bool,
}

pub async fn create_trainer(
	ctx: &BotContext,
	username: &str,
	faction: Faction,
) -> Result<Trainer, TaggedError> {
	let url = api_url()?;
	let token = api_token()?;

	let raw = ctx
		.http_client
		.post(format!("{url}/trainers/"))
		.header("Authorization", format!("Token {token}"))
		.json(&CreateTrainer {
			username,
			faction: faction.to_index() as u8,
			verified: true,
		})
		.send()
		.await
		.context("Failed to send request")?
		.error_for_status()
		.context("Request has non-ok status")?
		.json::<RawTrainer>()
		.await
		.context("Failed to decode response")?;

	Trainer::from_raw(raw)
}
// }}}
// {{{ Edit trainer
pub async fn edit_trainer(
	ctx: &BotContext,
	id: u64,
	edit: &TrainerEdit,
) -> Result<Trainer, TaggedError> {
	let url = api_url()?;
	let token = api_token()?;

	let raw = ctx
		.http_client
		.patch(format!("{url}/trainers/{id}/"))
		.header("Authorization", format!("Token {token}"))
		.json(edit)
		.send()
		.await
		.context("Failed to send request")?
		.error_for_status()
		.context("Request has non-ok status")?
		.json::<RawTrainer>()
		.await
		.context("Failed to decode response")?;

	Trainer::from_raw(raw)
}
// }}}
// {{{ Updates
pub async fn get_updates(ctx: &BotContext, trainer_id: u64) -> Result<Vec<Update>, TaggedError> {
	let url = api_url()?;
	let token = api_token()?;

	let raw = ctx
		.http_client
		.get(format!("{url}/trainers/{trainer_id}/updates/"))
		.header("Authorization", format!("Token {token}"))
		.send()
		.await
		.context("Failed to send request")?
		.error_for_status()
		.context("Request has non-ok status")?
		.json::<Vec<RawUpdate>>()
		.await
		.context("Failed to decode response")?;

	Ok(raw.into_iter().map(Update::from_raw).collect())
}

pub async fn post_update(
	ctx: &BotContext,
	trainer_id: u64,
	update: &NewUpdate,
) -> Result<Update, TaggedError> {
	let url = api_url()?;
	let token = api_token()?;

	let raw = ctx
		.http_client
		.post(format!("{url}/trainers/{trainer_id}/updates/"))
		.header("Authorization", format!("Token {token}"))
		.json(update)
		.send()
		.await
		.context("Failed to send request")?
		.error_for_status()
		.context("Request has non-ok status")?
		.json::<RawUpdate>()
		.await
		.context("Failed to decode response")?;

	Ok(Update::from_raw(raw))
}
// }}}
// {{{ Tests
#[cfg(test)]
mod new_update_tests {
	use super::*;

	#[test]
	fn integer_stats_round_instead_of_truncating() {
		let update = NewUpdate::for_stat(Stat::TotalXp, 1_999.6, SOURCE_COMMAND);
		assert_eq!(update.total_xp, Some(2_000));
		assert_eq!(update.data_source, Some(SOURCE_COMMAND));
	}

	#[test]
	fn fractional_stats_keep_their_precision() {
		let update = NewUpdate::for_stat(Stat::TravelKm, 1234.56, SOURCE_OCR);
		assert_eq!(update.travel_km, Some(1234.56));
		assert_eq!(update.total_xp, None);
	}
}
// }}}
