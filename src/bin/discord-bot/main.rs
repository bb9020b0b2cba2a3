use poise::serenity_prelude::{self as serenity};
use std::{env::var, sync::Arc, time::Duration};
use trainerdex::commands;
use trainerdex::context::{BotContext, Error};
use trainerdex::{ocr, scheduler};

// {{{ Error handler
async fn on_error(error: poise::FrameworkError<'_, BotContext, Error>) {
	if let Err(e) = poise::builtins::on_error(error).await {
		tracing::error!("Error while handling error: {}", e)
	}
}
// }}}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	tracing_subscriber::fmt()
		.with_env_filter(
			var("RUST_LOG").unwrap_or_else(|_| "trainerdex=info,serenity=warn".to_string()),
		)
		.init();

	// {{{ Poise options
	let options = poise::FrameworkOptions {
		commands: commands::all(),
		prefix_options: poise::PrefixFrameworkOptions {
			prefix: Some("!".to_string()),
			edit_tracker: Some(Arc::new(poise::EditTracker::for_timespan(
				Duration::from_secs(3600),
			))),
			..Default::default()
		},
		on_error: |error| Box::pin(on_error(error)),
		event_handler: |ctx, event, _framework, data| {
			Box::pin(async move {
				if let serenity::FullEvent::Message { new_message } = event {
					if let Err(error) = ocr::handle_message(ctx, data, new_message).await {
						tracing::error!("Screenshot ingestion failed: {error:?}");
					}
				}

				Ok(())
			})
		},
		..Default::default()
	};
	// }}}
	// {{{ Start poise
	let framework = poise::Framework::builder()
		.setup(move |ctx, _ready, framework| {
			Box::pin(async move {
				println!("Logged in as {}", _ready.user.name);
				poise::builtins::register_globally(ctx, &framework.options().commands).await?;
				ctx.set_presence(
					Some(serenity::ActivityData::playing("Pokémon Go")),
					serenity::OnlineStatus::Online,
				);

				let data = BotContext::new()?;
				scheduler::spawn(ctx.clone(), data.clone());

				Ok(data)
			})
		})
		.options(options)
		.build();

	let token =
		var("TRAINERDEX_DISCORD_TOKEN").expect("Missing `TRAINERDEX_DISCORD_TOKEN` env var");
	let intents =
		serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

	let client = serenity::ClientBuilder::new(token, intents)
		.framework(framework)
		.await;

	client.unwrap().start().await.unwrap()
	// }}}
}
