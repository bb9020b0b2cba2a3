// {{{ Imports
use anyhow::anyhow;
use poise::serenity_prelude as serenity;

use crate::api;
use crate::api::trainer::{NewUpdate, SOURCE_APPROVAL};
use crate::config::GuildConfig;
use crate::context::{Error, ErrorKind, PoiseContext, TagError, TaggedError};
use crate::converters::{parse_nickname, parse_stat_value};
use crate::pogo::faction::Faction;
use crate::pogo::progress::{latest_update, warrants_update};
use crate::pogo::stats::Stat;

use super::discord::{MessageContext, SideEffectError};
use super::profile::send_profile_card;
// }}}

// {{{ Action report
/// Outcome of one side effect in the approval workflow. Failures
/// accumulate here instead of aborting the whole command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
	Success,
	Skipped(String),
	PermissionDenied,
	Failed(String),
}

#[derive(Debug, Default)]
pub struct ActionReport {
	entries: Vec<(String, ActionOutcome)>,
}

impl ActionReport {
	pub fn record(&mut self, action: impl Into<String>, outcome: ActionOutcome) {
		self.entries.push((action.into(), outcome));
	}

	pub fn record_side_effect(
		&mut self,
		action: impl Into<String>,
		result: Result<(), SideEffectError>,
	) {
		let outcome = match result {
			Ok(()) => ActionOutcome::Success,
			Err(SideEffectError::PermissionDenied) => ActionOutcome::PermissionDenied,
			Err(SideEffectError::Other(error)) => ActionOutcome::Failed(error.to_string()),
		};

		self.record(action, outcome);
	}

	pub fn outcomes(&self) -> &[(String, ActionOutcome)] {
		&self.entries
	}

	pub fn render(&self) -> String {
		self.entries
			.iter()
			.map(|(action, outcome)| match outcome {
				ActionOutcome::Success => format!("✅ {action}"),
				ActionOutcome::Skipped(reason) => format!("⚠️ {action} — skipped: {reason}"),
				ActionOutcome::PermissionDenied => {
					format!("⛔ {action} — I'm missing the permissions for this")
				}
				ActionOutcome::Failed(reason) => format!("❌ {action} — {reason}"),
			})
			.collect::<Vec<_>>()
			.join("\n")
	}
}
// }}}
// {{{ Moderator gate
/// With no mod roles configured, the gate defers entirely to the
/// Discord-side command permission defaults.
pub fn is_approver(mod_roles: &[u64], author_roles: &[u64]) -> bool {
	mod_roles.is_empty() || mod_roles.iter().any(|role| author_roles.contains(role))
}
// }}}
// {{{ Workflow
async fn approve_impl<C: MessageContext>(
	ctx: &mut C,
	member_id: u64,
	nickname: String,
	team: Faction,
	total_xp: String,
) -> Result<(), TaggedError> {
	let nickname = parse_nickname(&nickname)?;
	let total_xp = parse_stat_value(&total_xp)?;
	let guild_id = ctx
		.guild_id()
		.ok_or_else(|| anyhow!("This command only works inside a server").tag(ErrorKind::User))?;
	let config = GuildConfig::get(ctx.data(), guild_id)?;

	if !is_approver(&config.mod_roles, &ctx.author_roles().await) {
		return Err(
			anyhow!("Only this server's configured moderators may approve trainers.")
				.tag(ErrorKind::User),
		);
	}

	let mut report = ActionReport::default();

	// {{{ (1) Resolve the trainer, by nickname then by Discord account
	let mut trainer = api::trainer::search_trainers(ctx.data(), &nickname)
		.await?
		.into_iter()
		.find(|trainer| trainer.username.eq_ignore_ascii_case(&nickname));

	if trainer.is_none() {
		if let Some(connection) = api::social::get_social_connection(ctx.data(), member_id).await?
		{
			if let Some(trainer_id) = connection.trainer_id {
				trainer = Some(api::trainer::get_trainer(ctx.data(), trainer_id).await?);
			}
		}
	}
	// }}}
	// {{{ (2) Roles
	if config.assign_roles_on_approval {
		let mut add = config.roles_to_assign.clone();
		add.extend(config.team_role(team));

		let result = ctx
			.edit_member_roles(member_id, &add, &config.roles_to_remove)
			.await;
		report.record_side_effect("Update roles", result);
	}
	// }}}
	// {{{ (3) Nickname sync
	if config.set_nickname_on_approval {
		let result = ctx.rename_member(member_id, &nickname).await;
		report.record_side_effect("Set nickname", result);
	}
	// }}}
	// {{{ (4) Create & link a profile when none was found
	let trainer = match trainer {
		Some(trainer) => {
			report.record("Find existing profile", ActionOutcome::Success);
			trainer
		}
		None => match api::trainer::create_trainer(ctx.data(), &nickname, team).await {
			Ok(trainer) => {
				match api::social::create_social_connection(
					ctx.data(),
					trainer.owner_id,
					member_id,
				)
				.await
				{
					Ok(_) => report.record("Create & link profile", ActionOutcome::Success),
					Err(error) => report.record(
						"Link profile to Discord account",
						ActionOutcome::Failed(error.error.to_string()),
					),
				}

				trainer
			}
			Err(error) => {
				// without a profile there is nothing left to do
				report.record("Create profile", ActionOutcome::Failed(error.error.to_string()));
				ctx.reply(&format!(
					"**Could not approve {nickname}:**\n{}",
					report.render()
				))
				.await?;
				return Ok(());
			}
		},
	};
	// }}}
	// {{{ (5) Only post stats that actually went up
	let updates = api::trainer::get_updates(ctx.data(), trainer.id).await?;

	if warrants_update(latest_update(&updates), &[(Stat::TotalXp, total_xp)]) {
		let posted = api::trainer::post_update(
			ctx.data(),
			trainer.id,
			&NewUpdate::for_stat(Stat::TotalXp, total_xp, SOURCE_APPROVAL),
		)
		.await;

		match posted {
			Ok(_) => report.record("Post Total XP update", ActionOutcome::Success),
			Err(error) => report.record(
				"Post Total XP update",
				ActionOutcome::Failed(error.error.to_string()),
			),
		}
	} else {
		report.record(
			"Post Total XP update",
			ActionOutcome::Skipped("the profile already records at least that much".to_owned()),
		);
	}
	// }}}
	// {{{ Welcome note
	if let Some(note) = &config.introduction_note {
		let result = ctx.dm_user(member_id, note).await;
		report.record_side_effect("Send welcome note", result);
	}
	// }}}
	// {{{ (6) Summary, then the fresh profile card
	ctx.reply(&format!("**Approved {nickname}!**\n{}", report.render()))
		.await?;

	let updates = api::trainer::get_updates(ctx.data(), trainer.id).await?;
	send_profile_card(ctx, &trainer, &updates).await?;
	// }}}

	Ok(())
}
// }}}
// {{{ Discord wrapper
/// Approve a new member: assign roles, sync their nickname, and create/update their TrainerDex profile.
#[poise::command(
	prefix_command,
	slash_command,
	guild_only,
	default_member_permissions = "MANAGE_ROLES"
)]
pub async fn approve(
	mut ctx: PoiseContext<'_>,
	#[description = "The member being approved"] member: serenity::Member,
	#[description = "Their in-game nickname"] nickname: String,
	#[description = "Their team"] team: Faction,
	#[description = "Total XP from their trainer screen"] total_xp: String,
) -> Result<(), Error> {
	ctx.defer().await?;
	let res = approve_impl(&mut ctx, member.user.id.get(), nickname, team, total_xp).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Tests
#[cfg(test)]
mod report_tests {
	use super::*;

	#[test]
	fn outcomes_render_as_an_action_log() {
		let mut report = ActionReport::default();
		report.record("Update roles", ActionOutcome::Success);
		report.record("Set nickname", ActionOutcome::PermissionDenied);
		report.record(
			"Post Total XP update",
			ActionOutcome::Skipped("already up to date".to_owned()),
		);
		report.record("Send welcome note", ActionOutcome::Failed("timed out".to_owned()));

		assert_eq!(
			report.render(),
			"✅ Update roles\n\
			 ⛔ Set nickname — I'm missing the permissions for this\n\
			 ⚠️ Post Total XP update — skipped: already up to date\n\
			 ❌ Send welcome note — timed out"
		);
	}

	#[test]
	fn side_effect_results_map_onto_outcomes() {
		let mut report = ActionReport::default();
		report.record_side_effect("a", Ok(()));
		report.record_side_effect("b", Err(SideEffectError::PermissionDenied));
		report.record_side_effect(
			"c",
			Err(SideEffectError::Other(anyhow!("boom"))),
		);

		assert_eq!(
			report.outcomes(),
			&[
				("a".to_owned(), ActionOutcome::Success),
				("b".to_owned(), ActionOutcome::PermissionDenied),
				("c".to_owned(), ActionOutcome::Failed("boom".to_owned())),
			]
		);
	}

	#[test]
	fn moderator_gate() {
		// no configured roles defers to Discord's own permissions
		assert!(is_approver(&[], &[]));
		assert!(is_approver(&[], &[1, 2]));

		assert!(is_approver(&[5], &[1, 5]));
		assert!(!is_approver(&[5], &[1, 2]));
		assert!(!is_approver(&[5], &[]));
	}

	#[tokio::test]
	async fn denied_mutations_land_in_the_report() -> Result<(), Error> {
		use crate::commands::discord::mock::MockSideEffect;
		use crate::context::testing::get_mock_context;

		let (mut ctx, _guard) = get_mock_context()?;
		let mut report = ActionReport::default();

		ctx.deny_permissions = true;
		let result = ctx.edit_member_roles(1, &[2], &[]).await;
		report.record_side_effect("Update roles", result);
		assert_eq!(report.outcomes()[0].1, ActionOutcome::PermissionDenied);

		ctx.deny_permissions = false;
		let result = ctx.rename_member(1, "Ash").await;
		report.record_side_effect("Set nickname", result);
		assert_eq!(report.outcomes()[1].1, ActionOutcome::Success);

		// the denied role edit never went through
		assert_eq!(
			ctx.side_effects(),
			vec![MockSideEffect::Renamed {
				user_id: 1,
				nickname: "Ash".to_owned(),
			}]
		);

		Ok(())
	}
}
// }}}
