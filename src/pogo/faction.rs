use std::fmt::Display;

use anyhow::anyhow;

use crate::context::{ErrorKind, TagError, TaggedError};

// {{{ Faction
/// One of the four fixed in-game teams. Static reference data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, poise::ChoiceParameter)]
pub enum Faction {
	Teamless,
	Mystic,
	Valor,
	Instinct,
}

impl Faction {
	pub const FACTIONS: [Faction; 4] = [
		Faction::Teamless,
		Faction::Mystic,
		Faction::Valor,
		Faction::Instinct,
	];

	pub const FACTION_NAMES: [&'static str; 4] = ["Teamless", "Mystic", "Valor", "Instinct"];
	pub const FACTION_COLORS: [u32; 4] = [0x929292, 0x2a6ceb, 0xd6303e, 0xf8c71c];
	pub const FACTION_EMOJI: [&'static str; 4] = ["⚪", "🔵", "🔴", "🟡"];

	#[inline]
	pub fn to_index(self) -> usize {
		self as usize
	}

	#[inline]
	pub fn from_id(id: u8) -> Option<Self> {
		Self::FACTIONS.get(id as usize).copied()
	}

	#[inline]
	pub fn color(self) -> u32 {
		Self::FACTION_COLORS[self.to_index()]
	}

	#[inline]
	pub fn emoji(self) -> &'static str {
		Self::FACTION_EMOJI[self.to_index()]
	}

	/// Resolves any of the documented aliases for a team: the numeric
	/// id, the English name, or the team's color.
	pub fn from_alias(alias: &str) -> Result<Self, TaggedError> {
		match alias.trim().to_lowercase().as_str() {
			"0" | "teamless" | "gray" | "grey" | "none" => Ok(Self::Teamless),
			"1" | "mystic" | "blue" => Ok(Self::Mystic),
			"2" | "valor" | "red" => Ok(Self::Valor),
			"3" | "instinct" | "yellow" => Ok(Self::Instinct),
			_ => Err(anyhow!("`{alias}` is not a team I know about").tag(ErrorKind::User)),
		}
	}
}

impl Display for Faction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", Self::FACTION_NAMES[self.to_index()])
	}
}
// }}}
// {{{ Tests
#[cfg(test)]
mod faction_tests {
	use super::*;

	#[test]
	fn aliases_resolve_to_the_same_team() {
		for (faction, aliases) in [
			(Faction::Teamless, ["0", "Teamless", "gray", "grey"]),
			(Faction::Mystic, ["1", "Mystic", "blue", "MYSTIC"]),
			(Faction::Valor, ["2", "valor", "red", " Valor "]),
			(Faction::Instinct, ["3", "instinct", "yellow", "Yellow"]),
		] {
			for alias in aliases {
				assert_eq!(faction, Faction::from_alias(alias).unwrap(), "{alias}");
			}
		}
	}

	#[test]
	fn unknown_aliases_are_user_errors() {
		for alias in ["4", "harmony", "", "mystik"] {
			let err = Faction::from_alias(alias).unwrap_err();
			assert_eq!(err.kind, ErrorKind::User);
		}
	}

	#[test]
	fn wire_ids_roundtrip() {
		for faction in Faction::FACTIONS {
			assert_eq!(
				Some(faction),
				Faction::from_id(faction.to_index() as u8)
			);
		}
		assert_eq!(None, Faction::from_id(4));
	}
}
// }}}
