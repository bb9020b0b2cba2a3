//! The weekly gains fan-out: an hourly tick that, for every guild
//! with a configured leaderboard channel, posts the past week's gains
//! at Monday noon local time.

// {{{ Imports
use std::time::Duration;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use poise::serenity_prelude::{self as serenity, ChannelId, CreateMessage, CreateThread};
use tracing::{error, info};

use crate::api;
use crate::api::leaderboard::Scope;
use crate::config::GuildConfig;
use crate::context::{BotContext, Error};
use crate::embeds::{gains_page_embed, gains_summary_embed};
use crate::pogo::deadline::last_deadline;
use crate::pogo::leaderboard::{pages, GAINS_PAGE_SIZE};
use crate::pogo::stats::Stat;
// }}}

/// Interval between scheduler ticks. The deadline check below keeps
/// the actual posting cadence weekly.
const TICK: Duration = Duration::from_secs(3600);

pub fn spawn(ctx: serenity::Context, data: BotContext) {
	tokio::spawn(async move {
		let mut interval = tokio::time::interval(TICK);
		loop {
			interval.tick().await;
			if let Err(err) = tick(&ctx, &data).await {
				error!("Weekly gains tick failed: {err:?}");
			}
		}
	});
}

// {{{ Due check
/// Whether a guild's weekly post is due, and for which deadline:
/// Monday, the noon hour locally, and this week's boundary not yet
/// posted.
pub fn due(
	tz: Tz,
	gains_last_posted: Option<DateTime<Utc>>,
	now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
	let local = now.with_timezone(&tz);
	if local.weekday() != Weekday::Mon || local.hour() != 12 {
		return None;
	}

	let deadline = last_deadline(now, tz);
	if gains_last_posted.is_some_and(|posted| posted >= deadline) {
		return None;
	}

	Some(deadline)
}
// }}}
// {{{ Tick
/// One guild's failure must never block the others, so every guild
/// is awaited and logged independently.
async fn tick(ctx: &serenity::Context, data: &BotContext) -> Result<(), Error> {
	let now = Utc::now();

	for config in GuildConfig::with_leaderboard_channel(data)? {
		match post_gains_for_guild(ctx, data, &config, now).await {
			Ok(true) => info!("Posted weekly gains for guild {}", config.guild_id),
			Ok(false) => {}
			Err(err) => {
				error!(
					"Weekly gains post failed for guild {}: {err:?}",
					config.guild_id
				);
			}
		}
	}

	Ok(())
}

async fn post_gains_for_guild(
	ctx: &serenity::Context,
	data: &BotContext,
	config: &GuildConfig,
	now: DateTime<Utc>,
) -> Result<bool, Error> {
	let tz = config.tz();
	let Some(deadline) = due(tz, config.gains_last_posted, now) else {
		return Ok(false);
	};
	let Some(channel) = config.leaderboard_channel_id.map(ChannelId::new) else {
		return Ok(false);
	};

	// the completed week leading up to the deadline
	let window = (deadline - ChronoDuration::weeks(1), deadline);
	let days = (window.1 - window.0).num_days().max(1);

	let gains = api::leaderboard::get_gains_leaderboard(
		data,
		Stat::TotalXp,
		Scope::Guild(config.guild_id),
		window,
	)
	.await
	.map_err(|e| e.error)?;

	// {{{ Compact summary, then the full standings in a thread
	let summary = gains_summary_embed(Stat::TotalXp, &gains.entries, window);
	let message = channel
		.send_message(&ctx.http, CreateMessage::new().embed(summary))
		.await?;

	let thread = channel
		.create_thread_from_message(
			&ctx.http,
			message.id,
			CreateThread::new(format!(
				"Weekly gains — {}",
				deadline.with_timezone(&tz).format("%Y-%m-%d")
			)),
		)
		.await?;

	let pages = pages(&gains.entries, GAINS_PAGE_SIZE);
	let page_count = pages.len();
	for (index, page) in pages.into_iter().enumerate() {
		thread
			.id
			.send_message(
				&ctx.http,
				CreateMessage::new()
					.embed(gains_page_embed(Stat::TotalXp, page, index, page_count, days)),
			)
			.await?;
	}
	// }}}

	let mut config = config.clone();
	config.gains_last_posted = Some(now);
	config.save(data)?;

	Ok(true)
}
// }}}
// {{{ Tests
#[cfg(test)]
mod due_tests {
	use chrono::TimeZone;

	use super::*;

	fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
	}

	#[test]
	fn due_only_in_the_monday_noon_hour() {
		// 2024-09-02 is a Monday
		assert_eq!(
			due(Tz::UTC, None, utc(2024, 9, 2, 12)),
			Some(utc(2024, 9, 2, 12))
		);
		assert!(due(Tz::UTC, None, utc(2024, 9, 2, 11)).is_none());
		assert!(due(Tz::UTC, None, utc(2024, 9, 2, 13)).is_none());
		assert!(due(Tz::UTC, None, utc(2024, 9, 3, 12)).is_none());
	}

	#[test]
	fn posting_is_idempotent_within_a_week() {
		let noon = utc(2024, 9, 2, 12);

		// a post from last week doesn't block this one
		assert!(due(Tz::UTC, Some(noon - ChronoDuration::weeks(1)), noon).is_some());

		// one from this deadline does
		assert!(due(Tz::UTC, Some(noon), noon).is_none());
		assert!(due(Tz::UTC, Some(noon + ChronoDuration::minutes(30)), noon).is_none());
	}

	#[test]
	fn due_follows_the_guild_timezone() {
		let tz: Tz = "America/New_York".parse().unwrap();

		// Monday 12:xx New York is Monday 16:xx UTC during DST
		assert!(due(tz, None, utc(2024, 9, 2, 16)).is_some());
		assert!(due(tz, None, utc(2024, 9, 2, 12)).is_none());
	}
}
// }}}
