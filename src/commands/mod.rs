use crate::context::{BotContext, Error, PoiseContext};

pub mod approve;
pub mod discord;
pub mod leaderboard;
pub mod profile;
pub mod settings;
pub mod update;

// {{{ Help
/// Show this help menu
#[poise::command(prefix_command, track_edits, slash_command)]
pub async fn help(
	ctx: PoiseContext<'_>,
	#[description = "Specific command to show help about"]
	#[autocomplete = "poise::builtins::autocomplete_command"]
	command: Option<String>,
) -> Result<(), Error> {
	poise::builtins::help(
		ctx,
		command.as_deref(),
		poise::builtins::HelpConfiguration {
			extra_text_at_bottom: "TrainerDex keeps track of Pokémon Go progress.",
			show_subcommands: true,
			..Default::default()
		},
	)
	.await?;
	Ok(())
}
// }}}

/// Every command the bot registers, in display order.
pub fn all() -> Vec<poise::Command<BotContext, Error>> {
	vec![
		help(),
		profile::profile(),
		profile::get_trainer_code(),
		profile::edit_profile(),
		update::update(),
		leaderboard::leaderboard(),
		approve::approve(),
		settings::server_config(),
		settings::notice(),
	]
}
