// {{{ Imports
use anyhow::anyhow;

use crate::api;
use crate::api::trainer::{NewUpdate, SOURCE_COMMAND};
use crate::context::{Error, ErrorKind, PoiseContext, TagError, TaggedError};
use crate::converters::parse_stat_value;
use crate::pogo::progress::{latest_update, warrants_update};
use crate::pogo::stats::Stat;

use super::discord::MessageContext;
use super::profile::{resolve_trainer, send_profile_card};
// }}}

// {{{ Implementation
async fn update_impl<C: MessageContext>(
	ctx: &mut C,
	stat: Stat,
	value: String,
) -> Result<(), TaggedError> {
	let value = parse_stat_value(&value)?;
	let trainer = resolve_trainer(ctx, None, None).await?;

	let updates = api::trainer::get_updates(ctx.data(), trainer.id).await?;
	if !warrants_update(latest_update(&updates), &[(stat, value)]) {
		return Err(anyhow!(
			"Your {} is already at or above {} — nothing to update.",
			stat,
			stat.format_value(value)
		)
		.tag(ErrorKind::User));
	}

	let posted = api::trainer::post_update(
		ctx.data(),
		trainer.id,
		&NewUpdate::for_stat(stat, value, SOURCE_COMMAND),
	)
	.await?;

	let mut updates = updates;
	updates.push(posted);
	send_profile_card(ctx, &trainer, &updates).await
}
// }}}
// {{{ Discord wrapper
/// Submit a new value for one of your statistics.
#[poise::command(prefix_command, slash_command, user_cooldown = 5)]
pub async fn update(
	mut ctx: PoiseContext<'_>,
	#[description = "Which statistic you're updating"] stat: Stat,
	#[description = "The new value, straight from your trainer screen"] value: String,
) -> Result<(), Error> {
	ctx.defer().await?;
	let res = update_impl(&mut ctx, stat, value).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
