// {{{ Imports
use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::context::{BotContext, TaggedError};

use super::{api_token, api_url};
// }}}

/// The provider tag the remote service files Discord accounts under.
const PROVIDER: &str = "discord";

// {{{ Wire types
#[derive(Deserialize)]
struct RawSocialConnection {
	user: u64,
	#[allow(unused)]
	provider: String,
	uid: String,
	#[serde(default)]
	trainer: Option<u64>,
}

#[derive(Serialize)]
struct CreateSocialConnection<'a> {
	user: u64,
	provider: &'a str,
	uid: String,
}
// }}}
// {{{ Domain type
/// Link between a Discord account and a remote service account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialConnection {
	pub user_id: u64,
	pub uid: String,
	pub trainer_id: Option<u64>,
}

impl SocialConnection {
	fn from_raw(raw: RawSocialConnection) -> Self {
		Self {
			user_id: raw.user,
			uid: raw.uid,
			trainer_id: raw.trainer,
		}
	}
}
// }}}
// {{{ Lookup
/// An unlinked Discord account is an everyday case, so it comes back
/// as `None` rather than an error.
pub async fn get_social_connection(
	ctx: &BotContext,
	discord_id: u64,
) -> Result<Option<SocialConnection>, TaggedError> {
	let url = api_url()?;
	let token = api_token()?;

	let raw = ctx
		.http_client
		.get(format!("{url}/users/social/"))
		.query(&[("provider", PROVIDER), ("uid", &discord_id.to_string())])
		.header("Authorization", format!("Token {token}"))
		.send()
		.await
		.context("Failed to send request")?
		.error_for_status()
		.context("Request has non-ok status")?
		.json::<Vec<RawSocialConnection>>()
		.await
		.context("Failed to decode response")?;

	Ok(raw.into_iter().next().map(SocialConnection::from_raw))
}
// }}}
// {{{ Creation
pub async fn create_social_connection(
	ctx: &BotContext,
	user_id: u64,
	discord_id: u64,
) -> Result<SocialConnection, TaggedError> {
	let url = api_url()?;
	let token = api_token()?;

	let raw = ctx
		.http_client
		.post(format!("{url}/users/social/"))
		.header("Authorization", format!("Token {token}"))
		.json(&CreateSocialConnection {
			user: user_id,
			provider: PROVIDER,
			uid: discord_id.to_string(),
		})
		.send()
		.await
		.context("Failed to send request")?
		.error_for_status()
		.context("Request has non-ok status")?
		.json::<RawSocialConnection>()
		.await
		.context("Failed to decode response")?;

	Ok(SocialConnection::from_raw(raw))
}
// }}}
