// {{{ Imports
use anyhow::anyhow;
use chrono_tz::Tz;
use poise::serenity_prelude as serenity;
use tracing::warn;

use crate::api;
use crate::api::leaderboard::Scope;
use crate::api::trainer::{Trainer, TrainerEdit, Update};
use crate::config::{GlobalConfig, GuildConfig};
use crate::context::{Error, ErrorKind, PoiseContext, TagError, TaggedError};
use crate::converters::{parse_nickname, parse_trainer_code};
use crate::embeds::{format_trainer_code, profile_embed};
use crate::pogo::progress::{game_launch, latest_update, progress};
use crate::pogo::stats::Stat;

use super::discord::MessageContext;
// }}}

// {{{ Trainer resolution
/// Find the trainer a command refers to: an explicit nickname wins,
/// then an explicit member, then the author themselves.
pub(crate) async fn resolve_trainer<C: MessageContext>(
	ctx: &C,
	nickname: Option<&str>,
	member: Option<u64>,
) -> Result<Trainer, TaggedError> {
	if let Some(nickname) = nickname {
		let nickname = parse_nickname(nickname)?;
		let found = api::trainer::search_trainers(ctx.data(), &nickname).await?;

		found
			.into_iter()
			.find(|trainer| trainer.username.eq_ignore_ascii_case(&nickname))
			.ok_or_else(|| anyhow!("No trainer named `{nickname}` was found").tag(ErrorKind::User))
	} else {
		let discord_id = member.unwrap_or_else(|| ctx.author_id());

		let connection = api::social::get_social_connection(ctx.data(), discord_id)
			.await?
			.ok_or_else(|| {
				anyhow!("<@{discord_id}> hasn't linked a TrainerDex profile yet")
					.tag(ErrorKind::User)
			})?;
		let trainer_id = connection.trainer_id.ok_or_else(|| {
			anyhow!("<@{discord_id}>'s account isn't attached to a trainer yet")
				.tag(ErrorKind::User)
		})?;

		api::trainer::get_trainer(ctx.data(), trainer_id).await
	}
}
// }}}
// {{{ Leaderboard-position enrichment
/// Stats shown with leaderboard positions on profile cards.
const RANKED_STATS: [Stat; 4] = [
	Stat::TotalXp,
	Stat::TravelKm,
	Stat::CaptureTotal,
	Stat::PokestopsVisited,
];

/// One lookup per stat and scope. A failed lookup or an absent rank
/// just omits that entry — never fatal to the render.
pub(crate) async fn rank_fields<C: MessageContext>(
	ctx: &C,
	trainer: &Trainer,
) -> Vec<(Stat, String)> {
	let mut scopes = vec![("Global", Scope::Global)];
	if let Some(guild_id) = ctx.guild_id() {
		scopes.push(("Server", Scope::Guild(guild_id)));
	}

	let mut fields = Vec::new();
	for stat in RANKED_STATS {
		let mut parts = Vec::new();

		for &(label, scope) in &scopes {
			match api::leaderboard::get_leaderboard(ctx.data(), stat, scope).await {
				Ok(board) => {
					if let Some(entry) = board
						.entries
						.iter()
						.find(|entry| entry.username == trainer.username)
					{
						parts.push(format!("{label} #{}", entry.position));
					}
				}
				Err(error) => {
					warn!(
						"Skipping {} rank lookup: {:?}",
						stat.api_name(),
						error.error
					);
				}
			}
		}

		if !parts.is_empty() {
			fields.push((stat, parts.join(" · ")));
		}
	}

	fields
}
// }}}
// {{{ Profile
pub(crate) async fn send_profile_card<C: MessageContext>(
	ctx: &mut C,
	trainer: &Trainer,
	updates: &[Update],
) -> Result<(), TaggedError> {
	let Some(current) = latest_update(updates).cloned() else {
		ctx.reply("This trainer hasn't submitted any progress yet.")
			.await?;
		return Ok(());
	};

	let tz = match ctx.guild_id() {
		Some(guild_id) => GuildConfig::get(ctx.data(), guild_id)?.tz(),
		None => Tz::UTC,
	};

	let progress = progress(updates, &current, trainer.start_date, tz);
	let ranks = rank_fields(ctx, trainer).await;
	let mut embed = profile_embed(trainer, &progress, &ranks);

	// operator announcements ride along on every card
	if let Some(notice) = GlobalConfig::get(ctx.data())?.notice {
		embed = embed.description(notice);
	}

	ctx.send_embed(embed).await?;
	Ok(())
}

async fn profile_impl<C: MessageContext>(
	ctx: &mut C,
	nickname: Option<String>,
	member: Option<u64>,
) -> Result<(), TaggedError> {
	let explicit_target = nickname.is_some() || member.is_some();
	let trainer = resolve_trainer(ctx, nickname.as_deref(), member).await?;

	if explicit_target && !trainer.statistics_visible {
		return Err(anyhow!("This trainer keeps their statistics private.").tag(ErrorKind::User));
	}

	let updates = api::trainer::get_updates(ctx.data(), trainer.id).await?;
	send_profile_card(ctx, &trainer, &updates).await
}

/// Show a trainer's profile card.
#[poise::command(prefix_command, slash_command)]
pub async fn profile(
	mut ctx: PoiseContext<'_>,
	#[description = "Look up a trainer by nickname"] nickname: Option<String>,
	#[description = "Look up a trainer by Discord account"] member: Option<serenity::User>,
) -> Result<(), Error> {
	ctx.defer().await?;
	let res = profile_impl(&mut ctx, nickname, member.map(|user| user.id.get())).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Trainer code
async fn trainer_code_impl<C: MessageContext>(
	ctx: &mut C,
	member: Option<u64>,
) -> Result<(), TaggedError> {
	let trainer = resolve_trainer(ctx, None, member).await?;

	match &trainer.trainer_code {
		Some(code) => {
			ctx.reply(&format!(
				"{}'s trainer code: `{}`",
				trainer.username,
				format_trainer_code(code)
			))
			.await?;
			Ok(())
		}
		None => {
			Err(anyhow!("{} hasn't shared a trainer code.", trainer.username)
				.tag(ErrorKind::User))
		}
	}
}

/// Fetch a member's trainer code, ready to copy into the game.
#[poise::command(prefix_command, slash_command, rename = "get-trainer-code")]
pub async fn get_trainer_code(
	mut ctx: PoiseContext<'_>,
	#[description = "Whose code to fetch (yours when omitted)"] member: Option<serenity::User>,
) -> Result<(), Error> {
	let res = trainer_code_impl(&mut ctx, member.map(|user| user.id.get())).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Edit profile
/// Profile edits proxy straight to the remote service.
#[poise::command(
	prefix_command,
	slash_command,
	rename = "edit-profile",
	subcommands("start_date", "visibility", "trainer_code"),
	subcommand_required
)]
pub async fn edit_profile(_ctx: PoiseContext<'_>) -> Result<(), Error> {
	Ok(())
}

async fn start_date_impl<C: MessageContext>(ctx: &mut C, date: String) -> Result<(), TaggedError> {
	let date = chrono::NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
		.map_err(|_| anyhow!("`{date}` is not a `YYYY-MM-DD` date").tag(ErrorKind::User))?;

	if date < game_launch() {
		return Err(anyhow!("That's before the game even came out!").tag(ErrorKind::User));
	}

	let trainer = resolve_trainer(ctx, None, None).await?;
	api::trainer::edit_trainer(
		ctx.data(),
		trainer.id,
		&TrainerEdit {
			start_date: Some(date),
			..TrainerEdit::default()
		},
	)
	.await?;

	ctx.reply(&format!("Start date set to {date}.")).await?;
	Ok(())
}

/// Set the date you started playing.
#[poise::command(prefix_command, slash_command, rename = "start-date")]
async fn start_date(
	mut ctx: PoiseContext<'_>,
	#[description = "YYYY-MM-DD"] date: String,
) -> Result<(), Error> {
	let res = start_date_impl(&mut ctx, date).await;
	ctx.handle_error(res).await?;
	Ok(())
}

async fn visibility_impl<C: MessageContext>(ctx: &mut C, visible: bool) -> Result<(), TaggedError> {
	let trainer = resolve_trainer(ctx, None, None).await?;
	api::trainer::edit_trainer(
		ctx.data(),
		trainer.id,
		&TrainerEdit {
			statistics_visible: Some(visible),
			..TrainerEdit::default()
		},
	)
	.await?;

	ctx.reply(if visible {
		"Your statistics are now public."
	} else {
		"Your statistics are now hidden from other trainers."
	})
	.await?;
	Ok(())
}

/// Choose whether other trainers can see your statistics.
#[poise::command(prefix_command, slash_command)]
async fn visibility(
	mut ctx: PoiseContext<'_>,
	#[description = "Whether your statistics are public"] visible: bool,
) -> Result<(), Error> {
	let res = visibility_impl(&mut ctx, visible).await;
	ctx.handle_error(res).await?;
	Ok(())
}

async fn trainer_code_edit_impl<C: MessageContext>(
	ctx: &mut C,
	code: String,
) -> Result<(), TaggedError> {
	let code = parse_trainer_code(&code)?;

	let trainer = resolve_trainer(ctx, None, None).await?;
	api::trainer::edit_trainer(
		ctx.data(),
		trainer.id,
		&TrainerEdit {
			trainer_code: Some(code.clone()),
			..TrainerEdit::default()
		},
	)
	.await?;

	ctx.reply(&format!(
		"Trainer code set to `{}`.",
		format_trainer_code(&code)
	))
	.await?;
	Ok(())
}

/// Share your trainer code.
#[poise::command(prefix_command, slash_command, rename = "trainer-code")]
async fn trainer_code(
	mut ctx: PoiseContext<'_>,
	#[description = "Your twelve-digit trainer code"] code: String,
) -> Result<(), Error> {
	let res = trainer_code_edit_impl(&mut ctx, code).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
