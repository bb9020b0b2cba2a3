// {{{ Imports
use crate::api;
use crate::api::leaderboard::Scope;
use crate::context::{Error, PoiseContext, TaggedError};
use crate::embeds::{leaderboard_page_embed, no_results_message};
use crate::pogo::faction::Faction;
use crate::pogo::leaderboard::{filter_by_faction, pages, PAGE_SIZE};
use crate::pogo::stats::Stat;

use super::discord::MessageContext;
// }}}

// {{{ Scope choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum ScopeChoice {
	#[name = "This server"]
	Server,
	#[name = "Global"]
	Global,
}
// }}}
// {{{ Implementation
async fn leaderboard_impl<C: MessageContext>(
	ctx: &mut C,
	stat: Option<Stat>,
	scope: Option<ScopeChoice>,
	faction: Option<Faction>,
	page: Option<u32>,
) -> Result<(), TaggedError> {
	let stat = stat.unwrap_or(Stat::TotalXp);

	// outside a guild there is only the global board
	let (scope, scope_label) = match (scope.unwrap_or(ScopeChoice::Server), ctx.guild_id()) {
		(ScopeChoice::Server, Some(guild_id)) => (Scope::Guild(guild_id), "This server"),
		_ => (Scope::Global, "Global"),
	};

	let board = api::leaderboard::get_leaderboard(ctx.data(), stat, scope).await?;
	let entries = filter_by_faction(board.entries, faction);

	if entries.is_empty() {
		ctx.reply(&no_results_message(stat)).await?;
		return Ok(());
	}

	let pages = pages(&entries, PAGE_SIZE);
	let page_index = (page.unwrap_or(1).max(1) as usize).min(pages.len()) - 1;

	ctx.send_embed(leaderboard_page_embed(
		stat,
		scope_label,
		&board.aggregations,
		pages[page_index],
		page_index,
		pages.len(),
	))
	.await?;

	Ok(())
}
// }}}
// {{{ Discord wrapper
/// Browse the leaderboards.
#[poise::command(prefix_command, slash_command, user_cooldown = 3)]
pub async fn leaderboard(
	mut ctx: PoiseContext<'_>,
	#[description = "Which statistic to rank by (Total XP by default)"] stat: Option<Stat>,
	#[description = "Rank this server only, or everyone"] scope: Option<ScopeChoice>,
	#[description = "Only show one team"] faction: Option<Faction>,
	#[description = "Page to show"] page: Option<u32>,
) -> Result<(), Error> {
	ctx.defer().await?;
	let res = leaderboard_impl(&mut ctx, stat, scope, faction, page).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
