// {{{ Imports
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rusqlite::{params, Row};

use crate::context::{BotContext, Error};
use crate::pogo::faction::Faction;
// }}}

// {{{ Json helpers
fn roles_from_json(text: String) -> rusqlite::Result<Vec<u64>> {
	serde_json::from_str(&text).map_err(|e| {
		rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
	})
}

fn roles_to_json(roles: &[u64]) -> String {
	serde_json::to_string(roles).unwrap_or_else(|_| "[]".to_owned())
}
// }}}
// {{{ GuildConfig
/// Per-guild settings document. Looked up by snowflake and lazily
/// created with defaults on first access; there is no deletion path.
#[derive(Debug, Clone, PartialEq)]
pub struct GuildConfig {
	pub guild_id: u64,
	pub assign_roles_on_approval: bool,
	pub set_nickname_on_approval: bool,
	pub roles_to_assign: Vec<u64>,
	pub roles_to_remove: Vec<u64>,
	pub mod_roles: Vec<u64>,
	pub mystic_role: Option<u64>,
	pub valor_role: Option<u64>,
	pub instinct_role: Option<u64>,
	pub timezone: String,
	pub introduction_note: Option<String>,
	pub leaderboard_channel_id: Option<u64>,
	pub gains_last_posted: Option<DateTime<Utc>>,
}

impl GuildConfig {
	fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
		Ok(Self {
			guild_id: row.get::<_, i64>("guild_id")? as u64,
			assign_roles_on_approval: row.get("assign_roles_on_approval")?,
			set_nickname_on_approval: row.get("set_nickname_on_approval")?,
			roles_to_assign: roles_from_json(row.get("roles_to_assign")?)?,
			roles_to_remove: roles_from_json(row.get("roles_to_remove")?)?,
			mod_roles: roles_from_json(row.get("mod_roles")?)?,
			mystic_role: row.get::<_, Option<i64>>("mystic_role")?.map(|v| v as u64),
			valor_role: row.get::<_, Option<i64>>("valor_role")?.map(|v| v as u64),
			instinct_role: row
				.get::<_, Option<i64>>("instinct_role")?
				.map(|v| v as u64),
			timezone: row.get("timezone")?,
			introduction_note: row.get("introduction_note")?,
			leaderboard_channel_id: row
				.get::<_, Option<i64>>("leaderboard_channel_id")?
				.map(|v| v as u64),
			gains_last_posted: row.get("gains_last_posted")?,
		})
	}

	pub fn get(ctx: &BotContext, guild_id: u64) -> Result<Self, Error> {
		let conn = ctx.db.get()?;
		conn.prepare_cached("INSERT OR IGNORE INTO guild_config(guild_id) VALUES (?)")?
			.execute([guild_id as i64])?;

		let config = conn
			.prepare_cached("SELECT * FROM guild_config WHERE guild_id = ?")?
			.query_row([guild_id as i64], Self::from_row)?;

		Ok(config)
	}

	pub fn save(&self, ctx: &BotContext) -> Result<(), Error> {
		ctx.db
			.get()?
			.prepare_cached(
				"
          UPDATE guild_config
          SET assign_roles_on_approval=?,
              set_nickname_on_approval=?,
              roles_to_assign=?,
              roles_to_remove=?,
              mod_roles=?,
              mystic_role=?,
              valor_role=?,
              instinct_role=?,
              timezone=?,
              introduction_note=?,
              leaderboard_channel_id=?,
              gains_last_posted=?
          WHERE guild_id=?
        ",
			)?
			.execute(params![
				self.assign_roles_on_approval,
				self.set_nickname_on_approval,
				roles_to_json(&self.roles_to_assign),
				roles_to_json(&self.roles_to_remove),
				roles_to_json(&self.mod_roles),
				self.mystic_role.map(|v| v as i64),
				self.valor_role.map(|v| v as i64),
				self.instinct_role.map(|v| v as i64),
				self.timezone,
				self.introduction_note,
				self.leaderboard_channel_id.map(|v| v as i64),
				self.gains_last_posted,
				self.guild_id as i64,
			])?;

		Ok(())
	}

	/// Guilds that have opted into the weekly gains post.
	pub fn with_leaderboard_channel(ctx: &BotContext) -> Result<Vec<Self>, Error> {
		let conn = ctx.db.get()?;
		let configs = conn
			.prepare_cached(
				"SELECT * FROM guild_config WHERE leaderboard_channel_id IS NOT NULL",
			)?
			.query_map([], Self::from_row)?
			.collect::<Result<Vec<_>, _>>()?;

		Ok(configs)
	}

	/// The timezone column is validated on write, so a bad value can
	/// only mean manual database edits; fall back to UTC.
	pub fn tz(&self) -> Tz {
		self.timezone.parse().unwrap_or(Tz::UTC)
	}

	pub fn team_role(&self, faction: Faction) -> Option<u64> {
		match faction {
			Faction::Teamless => None,
			Faction::Mystic => self.mystic_role,
			Faction::Valor => self.valor_role,
			Faction::Instinct => self.instinct_role,
		}
	}
}
// }}}
// {{{ ChannelConfig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
	pub channel_id: u64,
	pub profile_ocr: bool,
}

impl ChannelConfig {
	fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
		Ok(Self {
			channel_id: row.get::<_, i64>("channel_id")? as u64,
			profile_ocr: row.get("profile_ocr")?,
		})
	}

	pub fn get(ctx: &BotContext, channel_id: u64) -> Result<Self, Error> {
		let conn = ctx.db.get()?;
		conn.prepare_cached("INSERT OR IGNORE INTO channel_config(channel_id) VALUES (?)")?
			.execute([channel_id as i64])?;

		let config = conn
			.prepare_cached("SELECT * FROM channel_config WHERE channel_id = ?")?
			.query_row([channel_id as i64], Self::from_row)?;

		Ok(config)
	}

	pub fn save(&self, ctx: &BotContext) -> Result<(), Error> {
		ctx.db
			.get()?
			.prepare_cached("UPDATE channel_config SET profile_ocr=? WHERE channel_id=?")?
			.execute(params![self.profile_ocr, self.channel_id as i64])?;

		Ok(())
	}
}
// }}}
// {{{ GlobalConfig
/// Singleton settings document; the row is seeded by the migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalConfig {
	pub notice: Option<String>,
}

impl GlobalConfig {
	pub fn get(ctx: &BotContext) -> Result<Self, Error> {
		let notice = ctx
			.db
			.get()?
			.prepare_cached("SELECT notice FROM global_config WHERE id = 0")?
			.query_row([], |row| row.get("notice"))?;

		Ok(Self { notice })
	}

	pub fn save(&self, ctx: &BotContext) -> Result<(), Error> {
		ctx.db
			.get()?
			.prepare_cached("UPDATE global_config SET notice=? WHERE id=0")?
			.execute(params![self.notice])?;

		Ok(())
	}
}
// }}}
// {{{ Tests
#[cfg(test)]
mod config_tests {
	use crate::context::testing::get_test_data;

	use super::*;

	#[test]
	fn guilds_are_created_with_defaults_on_first_access() -> Result<(), Error> {
		let (ctx, _guard) = get_test_data()?;
		let config = GuildConfig::get(&ctx, 1000)?;

		assert!(config.assign_roles_on_approval);
		assert!(config.set_nickname_on_approval);
		assert_eq!(config.timezone, "UTC");
		assert_eq!(config.roles_to_assign, Vec::<u64>::new());
		assert_eq!(config.gains_last_posted, None);

		Ok(())
	}

	#[test]
	fn guild_settings_roundtrip() -> Result<(), Error> {
		let (ctx, _guard) = get_test_data()?;
		let mut config = GuildConfig::get(&ctx, 1000)?;

		config.assign_roles_on_approval = false;
		config.roles_to_assign = vec![1, 2, 3];
		config.mystic_role = Some(42);
		config.timezone = "Europe/London".to_owned();
		config.leaderboard_channel_id = Some(777);
		config.gains_last_posted = Some(chrono::Utc::now());
		config.save(&ctx)?;

		assert_eq!(config, GuildConfig::get(&ctx, 1000)?);

		// other guilds are unaffected
		assert!(GuildConfig::get(&ctx, 2000)?.assign_roles_on_approval);

		Ok(())
	}

	#[test]
	fn team_roles_map_to_factions() -> Result<(), Error> {
		let (ctx, _guard) = get_test_data()?;
		let mut config = GuildConfig::get(&ctx, 1000)?;
		config.mystic_role = Some(1);
		config.valor_role = Some(2);

		assert_eq!(config.team_role(Faction::Mystic), Some(1));
		assert_eq!(config.team_role(Faction::Valor), Some(2));
		assert_eq!(config.team_role(Faction::Instinct), None);
		assert_eq!(config.team_role(Faction::Teamless), None);

		Ok(())
	}

	#[test]
	fn gains_query_only_sees_opted_in_guilds() -> Result<(), Error> {
		let (ctx, _guard) = get_test_data()?;
		GuildConfig::get(&ctx, 1)?;

		let mut config = GuildConfig::get(&ctx, 2)?;
		config.leaderboard_channel_id = Some(555);
		config.save(&ctx)?;

		let opted_in = GuildConfig::with_leaderboard_channel(&ctx)?;
		assert_eq!(
			vec![2],
			opted_in.iter().map(|c| c.guild_id).collect::<Vec<_>>()
		);

		Ok(())
	}

	#[test]
	fn channel_ocr_toggle_roundtrips() -> Result<(), Error> {
		let (ctx, _guard) = get_test_data()?;

		let mut config = ChannelConfig::get(&ctx, 123)?;
		assert!(!config.profile_ocr);

		config.profile_ocr = true;
		config.save(&ctx)?;
		assert!(ChannelConfig::get(&ctx, 123)?.profile_ocr);

		Ok(())
	}

	#[test]
	fn global_notice_roundtrips() -> Result<(), Error> {
		let (ctx, _guard) = get_test_data()?;
		assert_eq!(GlobalConfig::get(&ctx)?.notice, None);

		let config = GlobalConfig {
			notice: Some("Scheduled maintenance tonight".to_owned()),
		};
		config.save(&ctx)?;
		assert_eq!(config, GlobalConfig::get(&ctx)?);

		Ok(())
	}
}
// }}}
