//! Screenshot ingestion: messages with a single image attachment in
//! an OCR-enabled channel get forwarded to the external OCR service
//! and, when the numbers went up, posted as a progress update.

// {{{ Imports
use anyhow::{anyhow, Context as _};
use poise::serenity_prelude as serenity;
use serde::Deserialize;
use tracing::warn;

use crate::api;
use crate::api::trainer::{NewUpdate, SOURCE_OCR};
use crate::config::ChannelConfig;
use crate::context::{BotContext, Error, ErrorKind, TagError, TaggedError};
use crate::pogo::progress::latest_update;
use crate::pogo::stats::Stat;
// }}}

// {{{ OCR client
/// The numeric fields the OCR service extracts from a trainer
/// screen. Everything is optional — screenshots crop differently.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OcrScan {
	#[serde(default)]
	pub total_xp: Option<u64>,
	#[serde(default)]
	pub travel_km: Option<f64>,
	#[serde(default)]
	pub capture_total: Option<u64>,
	#[serde(default)]
	pub pokestops_visited: Option<u64>,
	#[serde(default)]
	pub gymbadges_gold: Option<u64>,
}

impl OcrScan {
	pub fn to_new_update(self) -> NewUpdate {
		NewUpdate {
			total_xp: self.total_xp,
			travel_km: self.travel_km,
			capture_total: self.capture_total,
			pokestops_visited: self.pokestops_visited,
			gymbadges_gold: self.gymbadges_gold,
			data_source: Some(SOURCE_OCR),
		}
	}
}

fn ocr_url() -> Result<String, TaggedError> {
	std::env::var("TRAINERDEX_OCR_URL").map_err(|_| {
		anyhow!("This instance of `trainerdex` is not set up for screenshot scanning.")
			.tag(ErrorKind::User)
	})
}

pub async fn scan_screenshot(ctx: &BotContext, bytes: Vec<u8>) -> Result<OcrScan, TaggedError> {
	let url = ocr_url()?;

	let scan = ctx
		.http_client
		.put(format!("{url}/v1/screenshot/activity/"))
		.header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
		.body(bytes)
		.send()
		.await
		.context("Failed to send request")?
		.error_for_status()
		.context("Request has non-ok status")?
		.json::<OcrScan>()
		.await
		.context("Failed to decode response")?;

	Ok(scan)
}
// }}}
// {{{ Verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrVerdict {
	/// Below what's on file — reject visibly.
	Lower,
	/// Nothing new — acknowledge without posting.
	Same,
	/// Post it.
	Higher,
}

pub fn ocr_verdict(stored_xp: Option<u64>, scanned_xp: u64) -> OcrVerdict {
	match stored_xp {
		Some(stored) if scanned_xp < stored => OcrVerdict::Lower,
		Some(stored) if scanned_xp == stored => OcrVerdict::Same,
		_ => OcrVerdict::Higher,
	}
}
// }}}
// {{{ Message handler
/// Reactions are cosmetic; their failures only get logged.
async fn react(ctx: &serenity::Context, message: &serenity::Message, emoji: char) {
	if let Err(error) = message.react(&ctx.http, emoji).await {
		warn!("Could not react to screenshot: {error:?}");
	}
}

/// Entry point for every gateway message. Filters down to "exactly
/// one image attachment, in an OCR-enabled channel, from a linked
/// trainer" before touching the network.
pub async fn handle_message(
	ctx: &serenity::Context,
	data: &BotContext,
	message: &serenity::Message,
) -> Result<(), Error> {
	if message.author.bot || message.guild_id.is_none() || message.content.starts_with('!') {
		return Ok(());
	}

	let [attachment] = message.attachments.as_slice() else {
		return Ok(());
	};
	if attachment.dimensions().is_none() {
		return Ok(());
	}

	if !ChannelConfig::get(data, message.channel_id.get())?.profile_ocr {
		return Ok(());
	}

	// {{{ Resolve the trainer; unlinked accounts are ignored
	let Some(connection) = api::social::get_social_connection(data, message.author.id.get())
		.await
		.map_err(|e| e.error)?
	else {
		return Ok(());
	};
	let Some(trainer_id) = connection.trainer_id else {
		return Ok(());
	};
	// }}}
	// {{{ Scan — OCR failures are user-facing, not fatal
	let bytes = attachment.download().await?;
	let scan = match scan_screenshot(data, bytes).await {
		Ok(scan) => scan,
		Err(error) => {
			message
				.reply(
					&ctx.http,
					format!("I couldn't read that screenshot: {}", error.error),
				)
				.await?;
			return Ok(());
		}
	};

	let Some(scanned_xp) = scan.total_xp else {
		message
			.reply(&ctx.http, "I couldn't find a Total XP value in that screenshot.")
			.await?;
		return Ok(());
	};
	// }}}
	// {{{ Compare and post
	let updates = api::trainer::get_updates(data, trainer_id)
		.await
		.map_err(|e| e.error)?;
	let stored_xp = latest_update(&updates).and_then(|update| update.total_xp);

	match ocr_verdict(stored_xp, scanned_xp) {
		OcrVerdict::Lower => {
			react(ctx, message, '⚠').await;
			message
				.reply(
					&ctx.http,
					format!(
						"That screenshot shows {} XP, but I already have {} on file.",
						Stat::TotalXp.format_value(scanned_xp as f64),
						Stat::TotalXp.format_value(stored_xp.unwrap_or(0) as f64),
					),
				)
				.await?;
		}
		OcrVerdict::Same => {
			react(ctx, message, '⚠').await;
		}
		OcrVerdict::Higher => {
			api::trainer::post_update(data, trainer_id, &scan.to_new_update())
				.await
				.map_err(|e| e.error)?;
			react(ctx, message, '✅').await;
			message
				.reply(
					&ctx.http,
					format!(
						"Total XP updated to {}.",
						Stat::TotalXp.format_value(scanned_xp as f64)
					),
				)
				.await?;
		}
	}
	// }}}

	Ok(())
}
// }}}
// {{{ Tests
#[cfg(test)]
mod verdict_tests {
	use super::*;

	#[test]
	fn verdict_table() {
		assert_eq!(ocr_verdict(Some(100), 99), OcrVerdict::Lower);
		assert_eq!(ocr_verdict(Some(100), 100), OcrVerdict::Same);
		assert_eq!(ocr_verdict(Some(100), 101), OcrVerdict::Higher);

		// a trainer with no recorded XP always passes
		assert_eq!(ocr_verdict(None, 0), OcrVerdict::Higher);
	}

	#[test]
	fn scans_become_updates_attributed_to_ocr() {
		let scan = OcrScan {
			total_xp: Some(1_000),
			travel_km: Some(12.5),
			capture_total: None,
			pokestops_visited: None,
			gymbadges_gold: None,
		};

		let update = scan.to_new_update();
		assert_eq!(update.total_xp, Some(1_000));
		assert_eq!(update.travel_km, Some(12.5));
		assert_eq!(update.capture_total, None);
		assert_eq!(update.data_source, Some(SOURCE_OCR));
	}
}
// }}}
