// {{{ Imports
use anyhow::anyhow;
use poise::serenity_prelude::{self as serenity, CreateEmbed, CreateMessage};
use poise::CreateReply;

use crate::context::{BotContext, Error, ErrorKind, TaggedError};
// }}}

// {{{ Side effects
/// Discord-side mutations report through this instead of raw
/// serenity errors, so partial failures stay distinguishable.
#[derive(Debug)]
pub enum SideEffectError {
	PermissionDenied,
	Other(Error),
}

fn classify(error: serenity::Error) -> SideEffectError {
	match &error {
		serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response))
			if response.status_code.as_u16() == 403 =>
		{
			SideEffectError::PermissionDenied
		}
		_ => SideEffectError::Other(error.into()),
	}
}
// }}}
// {{{ Trait
pub trait MessageContext {
	/// Get the user context held by the message
	fn data(&self) -> &BotContext;
	fn author_id(&self) -> u64;
	fn guild_id(&self) -> Option<u64>;

	/// Role ids held by the command's author; empty outside guilds.
	async fn author_roles(&self) -> Vec<u64>;

	/// Reply to the current message
	async fn reply(&mut self, text: &str) -> Result<(), Error>;

	/// Reply with an embed.
	async fn send_embed(&mut self, embed: CreateEmbed) -> Result<(), Error>;

	// {{{ Member mutations
	async fn edit_member_roles(
		&self,
		user_id: u64,
		add: &[u64],
		remove: &[u64],
	) -> Result<(), SideEffectError>;

	async fn rename_member(&self, user_id: u64, nickname: &str) -> Result<(), SideEffectError>;

	async fn dm_user(&self, user_id: u64, text: &str) -> Result<(), SideEffectError>;
	// }}}
	// {{{ Error handling
	/// User-kind errors become replies; internal ones propagate to
	/// the framework's error handler.
	async fn handle_error<T>(&mut self, result: Result<T, TaggedError>) -> Result<Option<T>, Error> {
		match result {
			Ok(value) => Ok(Some(value)),
			Err(error) => match error.kind {
				ErrorKind::User => {
					self.reply(&error.error.to_string()).await?;
					Ok(None)
				}
				ErrorKind::Internal => Err(error.error),
			},
		}
	}
	// }}}
}
// }}}
// {{{ Poise implementation
impl<'a> MessageContext for poise::Context<'a, BotContext, Error> {
	fn data(&self) -> &BotContext {
		Self::data(*self)
	}

	fn author_id(&self) -> u64 {
		self.author().id.get()
	}

	fn guild_id(&self) -> Option<u64> {
		Self::guild_id(*self).map(|id| id.get())
	}

	async fn author_roles(&self) -> Vec<u64> {
		match self.author_member().await {
			Some(member) => member.roles.iter().map(|role| role.get()).collect(),
			None => Vec::new(),
		}
	}

	async fn reply(&mut self, text: &str) -> Result<(), Error> {
		Self::reply(*self, text).await?;
		Ok(())
	}

	async fn send_embed(&mut self, embed: CreateEmbed) -> Result<(), Error> {
		self.send(CreateReply::default().embed(embed)).await?;
		Ok(())
	}

	// {{{ Member mutations
	async fn edit_member_roles(
		&self,
		user_id: u64,
		add: &[u64],
		remove: &[u64],
	) -> Result<(), SideEffectError> {
		let guild_id = Self::guild_id(*self)
			.ok_or_else(|| SideEffectError::Other(anyhow!("Not invoked inside a guild")))?;
		let user_id = serenity::UserId::new(user_id);

		for role in add {
			self.http()
				.add_member_role(
					guild_id,
					user_id,
					serenity::RoleId::new(*role),
					Some("TrainerDex approval"),
				)
				.await
				.map_err(classify)?;
		}

		for role in remove {
			self.http()
				.remove_member_role(
					guild_id,
					user_id,
					serenity::RoleId::new(*role),
					Some("TrainerDex approval"),
				)
				.await
				.map_err(classify)?;
		}

		Ok(())
	}

	async fn rename_member(&self, user_id: u64, nickname: &str) -> Result<(), SideEffectError> {
		let guild_id = Self::guild_id(*self)
			.ok_or_else(|| SideEffectError::Other(anyhow!("Not invoked inside a guild")))?;

		guild_id
			.edit_member(
				self.http(),
				serenity::UserId::new(user_id),
				serenity::EditMember::new()
					.nickname(nickname)
					.audit_log_reason("TrainerDex approval"),
			)
			.await
			.map_err(classify)?;

		Ok(())
	}

	async fn dm_user(&self, user_id: u64, text: &str) -> Result<(), SideEffectError> {
		let channel = serenity::UserId::new(user_id)
			.create_dm_channel(self.http())
			.await
			.map_err(classify)?;

		channel
			.send_message(self.http(), CreateMessage::new().content(text))
			.await
			.map_err(classify)?;

		Ok(())
	}
	// }}}
}
// }}}
// {{{ Testing context
pub mod mock {
	use std::sync::Mutex;

	use super::*;

	/// Recorded Discord-side mutation.
	#[derive(Debug, Clone, PartialEq, Eq)]
	pub enum MockSideEffect {
		RolesEdited {
			user_id: u64,
			added: Vec<u64>,
			removed: Vec<u64>,
		},
		Renamed {
			user_id: u64,
			nickname: String,
		},
		DirectMessage {
			user_id: u64,
			text: String,
		},
	}

	pub struct MockContext {
		pub user_id: u64,
		pub guild: Option<u64>,
		pub roles: Vec<u64>,
		pub data: BotContext,
		pub replies: Vec<String>,
		pub embeds: Vec<CreateEmbed>,
		// Member mutations go through `&self`, matching the poise
		// implementation, hence the interior mutability.
		side_effects: Mutex<Vec<MockSideEffect>>,
		/// When set, member mutations fail the way a missing
		/// permission does on the real API.
		pub deny_permissions: bool,
	}

	impl MockContext {
		pub fn new(data: BotContext) -> Self {
			Self {
				data,
				user_id: 666,
				guild: Some(1),
				roles: vec![],
				replies: vec![],
				embeds: vec![],
				side_effects: Mutex::new(vec![]),
				deny_permissions: false,
			}
		}

		pub fn side_effects(&self) -> Vec<MockSideEffect> {
			self.side_effects.lock().unwrap().clone()
		}

		fn mutate(&self, effect: MockSideEffect) -> Result<(), SideEffectError> {
			if self.deny_permissions {
				return Err(SideEffectError::PermissionDenied);
			}

			self.side_effects.lock().unwrap().push(effect);
			Ok(())
		}
	}

	impl MessageContext for MockContext {
		fn data(&self) -> &BotContext {
			&self.data
		}

		fn author_id(&self) -> u64 {
			self.user_id
		}

		fn guild_id(&self) -> Option<u64> {
			self.guild
		}

		async fn author_roles(&self) -> Vec<u64> {
			self.roles.clone()
		}

		async fn reply(&mut self, text: &str) -> Result<(), Error> {
			self.replies.push(text.to_owned());
			Ok(())
		}

		async fn send_embed(&mut self, embed: CreateEmbed) -> Result<(), Error> {
			self.embeds.push(embed);
			Ok(())
		}

		async fn edit_member_roles(
			&self,
			user_id: u64,
			add: &[u64],
			remove: &[u64],
		) -> Result<(), SideEffectError> {
			self.mutate(MockSideEffect::RolesEdited {
				user_id,
				added: add.to_vec(),
				removed: remove.to_vec(),
			})
		}

		async fn rename_member(
			&self,
			user_id: u64,
			nickname: &str,
		) -> Result<(), SideEffectError> {
			self.mutate(MockSideEffect::Renamed {
				user_id,
				nickname: nickname.to_owned(),
			})
		}

		async fn dm_user(&self, user_id: u64, text: &str) -> Result<(), SideEffectError> {
			self.mutate(MockSideEffect::DirectMessage {
				user_id,
				text: text.to_owned(),
			})
		}
	}
}
// }}}
