// {{{ Imports
use anyhow::anyhow;
use chrono_tz::Tz;
use poise::serenity_prelude::{self as serenity, CreateEmbed};

use crate::config::{ChannelConfig, GlobalConfig, GuildConfig};
use crate::context::{Error, ErrorKind, PoiseContext, TagError, TaggedError};
use crate::pogo::faction::Faction;

use super::discord::MessageContext;
// }}}

// {{{ Helpers
fn guild_config<C: MessageContext>(ctx: &C) -> Result<GuildConfig, TaggedError> {
	let guild_id = ctx
		.guild_id()
		.ok_or_else(|| anyhow!("This command only works inside a server").tag(ErrorKind::User))?;

	Ok(GuildConfig::get(ctx.data(), guild_id)?)
}

fn mention_roles(roles: &[u64]) -> String {
	if roles.is_empty() {
		"—".to_owned()
	} else {
		roles
			.iter()
			.map(|role| format!("<@&{role}>"))
			.collect::<Vec<_>>()
			.join(" ")
	}
}

fn on_off(enabled: bool) -> &'static str {
	if enabled {
		"on"
	} else {
		"off"
	}
}
// }}}
// {{{ Toplevel
/// Configure how TrainerDex behaves on this server.
#[poise::command(
	prefix_command,
	slash_command,
	rename = "server-config",
	subcommands(
		"show",
		"timezone",
		"assign_roles",
		"set_nickname",
		"team_role",
		"approval_grant_role",
		"approval_revoke_role",
		"mod_role",
		"introduction",
		"leaderboard_channel",
		"ocr"
	),
	subcommand_required,
	guild_only,
	required_permissions = "MANAGE_GUILD"
)]
pub async fn server_config(_ctx: PoiseContext<'_>) -> Result<(), Error> {
	Ok(())
}
// }}}
// {{{ Show
async fn show_impl<C: MessageContext>(ctx: &mut C) -> Result<(), TaggedError> {
	let config = guild_config(ctx)?;

	let embed = CreateEmbed::default()
		.title("TrainerDex server configuration")
		.field("Timezone", config.timezone.clone(), true)
		.field(
			"Assign roles on approval",
			on_off(config.assign_roles_on_approval),
			true,
		)
		.field(
			"Set nickname on approval",
			on_off(config.set_nickname_on_approval),
			true,
		)
		.field("Roles to assign", mention_roles(&config.roles_to_assign), false)
		.field("Roles to remove", mention_roles(&config.roles_to_remove), false)
		.field("Moderator roles", mention_roles(&config.mod_roles), false)
		.field(
			"Team roles",
			format!(
				"{} Mystic: {}\n{} Valor: {}\n{} Instinct: {}",
				Faction::Mystic.emoji(),
				mention_roles(config.mystic_role.as_slice()),
				Faction::Valor.emoji(),
				mention_roles(config.valor_role.as_slice()),
				Faction::Instinct.emoji(),
				mention_roles(config.instinct_role.as_slice()),
			),
			false,
		)
		.field(
			"Weekly gains channel",
			config
				.leaderboard_channel_id
				.map(|channel| format!("<#{channel}>"))
				.unwrap_or_else(|| "—".to_owned()),
			true,
		)
		.field(
			"Introduction note",
			config
				.introduction_note
				.clone()
				.unwrap_or_else(|| "—".to_owned()),
			false,
		);

	ctx.send_embed(embed).await?;
	Ok(())
}

/// Show this server's current configuration.
#[poise::command(prefix_command, slash_command)]
async fn show(mut ctx: PoiseContext<'_>) -> Result<(), Error> {
	let res = show_impl(&mut ctx).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Timezone
async fn timezone_impl<C: MessageContext>(ctx: &mut C, timezone: String) -> Result<(), TaggedError> {
	let parsed: Tz = timezone.trim().parse().map_err(|_| {
		anyhow!("`{timezone}` is not an IANA timezone (try `Europe/London`)").tag(ErrorKind::User)
	})?;

	let mut config = guild_config(ctx)?;
	config.timezone = parsed.name().to_owned();
	config.save(ctx.data())?;

	ctx.reply(&format!(
		"Weekly deadlines now follow {}.",
		parsed.name()
	))
	.await?;
	Ok(())
}

/// Set the timezone weekly deadlines are computed in.
#[poise::command(prefix_command, slash_command)]
async fn timezone(
	mut ctx: PoiseContext<'_>,
	#[description = "IANA timezone name, e.g. Europe/London"] timezone: String,
) -> Result<(), Error> {
	let res = timezone_impl(&mut ctx, timezone).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Approval toggles
async fn assign_roles_impl<C: MessageContext>(ctx: &mut C, enabled: bool) -> Result<(), TaggedError> {
	let mut config = guild_config(ctx)?;
	config.assign_roles_on_approval = enabled;
	config.save(ctx.data())?;

	ctx.reply(&format!("Role assignment on approval is now {}.", on_off(enabled)))
		.await?;
	Ok(())
}

/// Toggle role assignment during /approve.
#[poise::command(prefix_command, slash_command, rename = "assign-roles")]
async fn assign_roles(mut ctx: PoiseContext<'_>, enabled: bool) -> Result<(), Error> {
	let res = assign_roles_impl(&mut ctx, enabled).await;
	ctx.handle_error(res).await?;
	Ok(())
}

async fn set_nickname_impl<C: MessageContext>(ctx: &mut C, enabled: bool) -> Result<(), TaggedError> {
	let mut config = guild_config(ctx)?;
	config.set_nickname_on_approval = enabled;
	config.save(ctx.data())?;

	ctx.reply(&format!("Nickname sync on approval is now {}.", on_off(enabled)))
		.await?;
	Ok(())
}

/// Toggle nickname syncing during /approve.
#[poise::command(prefix_command, slash_command, rename = "set-nickname")]
async fn set_nickname(mut ctx: PoiseContext<'_>, enabled: bool) -> Result<(), Error> {
	let res = set_nickname_impl(&mut ctx, enabled).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Team roles
async fn team_role_impl<C: MessageContext>(
	ctx: &mut C,
	team: Faction,
	role_id: u64,
) -> Result<(), TaggedError> {
	if team == Faction::Teamless {
		return Err(anyhow!("Teamless trainers don't get a team role.").tag(ErrorKind::User));
	}

	let mut config = guild_config(ctx)?;
	match team {
		Faction::Mystic => config.mystic_role = Some(role_id),
		Faction::Valor => config.valor_role = Some(role_id),
		Faction::Instinct => config.instinct_role = Some(role_id),
		Faction::Teamless => unreachable!(),
	}
	config.save(ctx.data())?;

	ctx.reply(&format!("{} members now receive <@&{role_id}> on approval.", team))
		.await?;
	Ok(())
}

/// Pick the role handed to each team's members.
#[poise::command(prefix_command, slash_command, rename = "team-role")]
async fn team_role(
	mut ctx: PoiseContext<'_>,
	team: Faction,
	role: serenity::Role,
) -> Result<(), Error> {
	let res = team_role_impl(&mut ctx, team, role.id.get()).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Approval role lists
fn toggle(roles: &mut Vec<u64>, role_id: u64) -> bool {
	match roles.iter().position(|&role| role == role_id) {
		Some(index) => {
			roles.remove(index);
			false
		}
		None => {
			roles.push(role_id);
			true
		}
	}
}

async fn approval_grant_role_impl<C: MessageContext>(
	ctx: &mut C,
	role_id: u64,
) -> Result<(), TaggedError> {
	let mut config = guild_config(ctx)?;
	let added = toggle(&mut config.roles_to_assign, role_id);
	config.save(ctx.data())?;

	ctx.reply(&if added {
		format!("<@&{role_id}> is now granted on approval.")
	} else {
		format!("<@&{role_id}> is no longer granted on approval.")
	})
	.await?;
	Ok(())
}

/// Toggle a role granted to every approved member.
#[poise::command(prefix_command, slash_command, rename = "approval-grant-role")]
async fn approval_grant_role(mut ctx: PoiseContext<'_>, role: serenity::Role) -> Result<(), Error> {
	let res = approval_grant_role_impl(&mut ctx, role.id.get()).await;
	ctx.handle_error(res).await?;
	Ok(())
}

async fn approval_revoke_role_impl<C: MessageContext>(
	ctx: &mut C,
	role_id: u64,
) -> Result<(), TaggedError> {
	let mut config = guild_config(ctx)?;
	let added = toggle(&mut config.roles_to_remove, role_id);
	config.save(ctx.data())?;

	ctx.reply(&if added {
		format!("<@&{role_id}> is now removed on approval.")
	} else {
		format!("<@&{role_id}> is no longer removed on approval.")
	})
	.await?;
	Ok(())
}

/// Toggle a role taken away from every approved member.
#[poise::command(prefix_command, slash_command, rename = "approval-revoke-role")]
async fn approval_revoke_role(
	mut ctx: PoiseContext<'_>,
	role: serenity::Role,
) -> Result<(), Error> {
	let res = approval_revoke_role_impl(&mut ctx, role.id.get()).await;
	ctx.handle_error(res).await?;
	Ok(())
}

async fn mod_role_impl<C: MessageContext>(ctx: &mut C, role_id: u64) -> Result<(), TaggedError> {
	let mut config = guild_config(ctx)?;
	let added = toggle(&mut config.mod_roles, role_id);
	config.save(ctx.data())?;

	ctx.reply(&if added {
		format!("<@&{role_id}> members may now approve trainers.")
	} else {
		format!("<@&{role_id}> members may no longer approve trainers.")
	})
	.await?;
	Ok(())
}

/// Toggle a role whose members may use /approve.
#[poise::command(prefix_command, slash_command, rename = "mod-role")]
async fn mod_role(mut ctx: PoiseContext<'_>, role: serenity::Role) -> Result<(), Error> {
	let res = mod_role_impl(&mut ctx, role.id.get()).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Introduction note
async fn introduction_impl<C: MessageContext>(
	ctx: &mut C,
	note: Option<String>,
) -> Result<(), TaggedError> {
	let mut config = guild_config(ctx)?;
	config.introduction_note = note;
	config.save(ctx.data())?;

	ctx.reply(match &config.introduction_note {
		Some(_) => "Approved members will now receive that note as a DM.",
		None => "Approved members will no longer receive a welcome DM.",
	})
	.await?;
	Ok(())
}

/// Set the welcome note DMed to approved members (omit to clear).
#[poise::command(prefix_command, slash_command)]
async fn introduction(
	mut ctx: PoiseContext<'_>,
	#[description = "The note to send (omit to clear)"] note: Option<String>,
) -> Result<(), Error> {
	let res = introduction_impl(&mut ctx, note).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Leaderboard channel
async fn leaderboard_channel_impl<C: MessageContext>(
	ctx: &mut C,
	channel_id: Option<u64>,
) -> Result<(), TaggedError> {
	let mut config = guild_config(ctx)?;
	config.leaderboard_channel_id = channel_id;
	config.save(ctx.data())?;

	ctx.reply(&match channel_id {
		Some(channel) => format!("Weekly gains will be posted to <#{channel}>."),
		None => "Weekly gains posts are now disabled.".to_owned(),
	})
	.await?;
	Ok(())
}

/// Pick the channel for the weekly gains leaderboard (omit to disable).
#[poise::command(prefix_command, slash_command, rename = "leaderboard-channel")]
async fn leaderboard_channel(
	mut ctx: PoiseContext<'_>,
	#[description = "Where to post weekly gains (omit to disable)"] channel: Option<
		serenity::GuildChannel,
	>,
) -> Result<(), Error> {
	let res = leaderboard_channel_impl(&mut ctx, channel.map(|c| c.id.get())).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ OCR
async fn ocr_impl<C: MessageContext>(
	ctx: &mut C,
	channel_id: u64,
	enabled: bool,
) -> Result<(), TaggedError> {
	let mut config = ChannelConfig::get(ctx.data(), channel_id)?;
	config.profile_ocr = enabled;
	config.save(ctx.data())?;

	ctx.reply(&format!(
		"Screenshot scanning in <#{channel_id}> is now {}.",
		on_off(enabled)
	))
	.await?;
	Ok(())
}

/// Toggle screenshot scanning for the current channel.
#[poise::command(prefix_command, slash_command)]
async fn ocr(mut ctx: PoiseContext<'_>, enabled: bool) -> Result<(), Error> {
	let channel_id = ctx.channel_id().get();
	let res = ocr_impl(&mut ctx, channel_id, enabled).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Global notice
async fn notice_impl<C: MessageContext>(
	ctx: &mut C,
	notice: Option<String>,
) -> Result<(), TaggedError> {
	let mut config = GlobalConfig::get(ctx.data())?;
	config.notice = notice;
	config.save(ctx.data())?;

	ctx.reply(match &config.notice {
		Some(_) => "Notice set — it now shows on every profile card.",
		None => "Notice cleared.",
	})
	.await?;
	Ok(())
}

/// Set the notice shown on every profile card (bot owner only).
#[poise::command(prefix_command, slash_command, owners_only)]
pub async fn notice(
	mut ctx: PoiseContext<'_>,
	#[description = "The notice (omit to clear)"] text: Option<String>,
) -> Result<(), Error> {
	let res = notice_impl(&mut ctx, text).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Tests
#[cfg(test)]
mod settings_tests {
	use crate::context::testing::get_mock_context;
	use crate::context::ErrorKind;

	use super::*;

	#[tokio::test]
	async fn timezone_updates_are_validated() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;

		timezone_impl(&mut ctx, " Europe/London ".to_owned())
			.await
			.map_err(|e| e.error)?;
		assert_eq!(guild_config(&ctx).map_err(|e| e.error)?.timezone, "Europe/London");

		let err = timezone_impl(&mut ctx, "Narnia/Lantern".to_owned())
			.await
			.unwrap_err();
		assert_eq!(err.kind, ErrorKind::User);
		assert_eq!(guild_config(&ctx).map_err(|e| e.error)?.timezone, "Europe/London");

		Ok(())
	}

	#[tokio::test]
	async fn approval_toggles_persist() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;

		assign_roles_impl(&mut ctx, false)
			.await
			.map_err(|e| e.error)?;
		set_nickname_impl(&mut ctx, false)
			.await
			.map_err(|e| e.error)?;

		let config = guild_config(&ctx).map_err(|e| e.error)?;
		assert!(!config.assign_roles_on_approval);
		assert!(!config.set_nickname_on_approval);

		Ok(())
	}

	#[tokio::test]
	async fn role_lists_toggle_membership() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;

		approval_grant_role_impl(&mut ctx, 42)
			.await
			.map_err(|e| e.error)?;
		approval_grant_role_impl(&mut ctx, 43)
			.await
			.map_err(|e| e.error)?;
		assert_eq!(guild_config(&ctx).map_err(|e| e.error)?.roles_to_assign, vec![42, 43]);

		// a second toggle removes the role again
		approval_grant_role_impl(&mut ctx, 42)
			.await
			.map_err(|e| e.error)?;
		assert_eq!(guild_config(&ctx).map_err(|e| e.error)?.roles_to_assign, vec![43]);

		Ok(())
	}

	#[tokio::test]
	async fn teamless_gets_no_team_role() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;

		let err = team_role_impl(&mut ctx, Faction::Teamless, 1)
			.await
			.unwrap_err();
		assert_eq!(err.kind, ErrorKind::User);

		team_role_impl(&mut ctx, Faction::Mystic, 7)
			.await
			.map_err(|e| e.error)?;
		assert_eq!(guild_config(&ctx).map_err(|e| e.error)?.mystic_role, Some(7));

		Ok(())
	}

	#[tokio::test]
	async fn the_notice_is_global() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;

		notice_impl(&mut ctx, Some("Maintenance tonight".to_owned()))
			.await
			.map_err(|e| e.error)?;
		assert_eq!(
			GlobalConfig::get(ctx.data())?.notice.as_deref(),
			Some("Maintenance tonight")
		);

		notice_impl(&mut ctx, None).await.map_err(|e| e.error)?;
		assert_eq!(GlobalConfig::get(ctx.data())?.notice, None);

		Ok(())
	}

	#[tokio::test]
	async fn ocr_toggle_is_per_channel() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;

		ocr_impl(&mut ctx, 100, true).await.map_err(|e| e.error)?;

		let on = crate::config::ChannelConfig::get(ctx.data(), 100)?;
		let off = crate::config::ChannelConfig::get(ctx.data(), 101)?;
		assert!(on.profile_ocr);
		assert!(!off.profile_ocr);

		Ok(())
	}
}
// }}}
