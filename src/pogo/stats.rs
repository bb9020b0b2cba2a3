use std::fmt::Display;

// {{{ Stat
/// The game statistics the remote service tracks per update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, poise::ChoiceParameter)]
pub enum Stat {
	#[name = "Total XP"]
	TotalXp,
	#[name = "Distance walked"]
	TravelKm,
	#[name = "Pokémon caught"]
	CaptureTotal,
	#[name = "PokéStops visited"]
	PokestopsVisited,
	#[name = "Gold gym badges"]
	GymGold,
}

impl Stat {
	pub const STATS: [Stat; 5] = [
		Stat::TotalXp,
		Stat::TravelKm,
		Stat::CaptureTotal,
		Stat::PokestopsVisited,
		Stat::GymGold,
	];

	/// Field names used by the remote statistics API.
	pub const API_NAMES: [&'static str; 5] = [
		"total_xp",
		"travel_km",
		"capture_total",
		"pokestops_visited",
		"gymbadges_gold",
	];

	pub const DISPLAY_NAMES: [&'static str; 5] = [
		"Total XP",
		"Distance walked",
		"Pokémon caught",
		"PokéStops visited",
		"Gold gym badges",
	];

	#[inline]
	pub fn to_index(self) -> usize {
		self as usize
	}

	#[inline]
	pub fn api_name(self) -> &'static str {
		Self::API_NAMES[self.to_index()]
	}

	/// Whether values of this stat carry a fractional part.
	#[inline]
	pub fn is_fractional(self) -> bool {
		matches!(self, Stat::TravelKm)
	}

	pub fn format_value(self, value: f64) -> String {
		if self.is_fractional() {
			format!("{} km", group_float(value))
		} else {
			group_digits(value.round() as i64)
		}
	}

	/// Like [Self::format_value], but always carries a leading sign.
	pub fn format_delta(self, delta: f64) -> String {
		let sign = if delta < 0.0 { "" } else { "+" };
		format!("{sign}{}", self.format_value(delta))
	}
}

impl Display for Stat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", Self::DISPLAY_NAMES[self.to_index()])
	}
}
// }}}
// {{{ Digit grouping
/// Formats an integer with thousands separators.
pub fn group_digits(value: i64) -> String {
	let negative = value < 0;
	let digits = value.unsigned_abs().to_string();
	let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

	if negative {
		out.push('-');
	}

	for (i, c) in digits.chars().enumerate() {
		if i != 0 && (digits.len() - i) % 3 == 0 {
			out.push(',');
		}
		out.push(c);
	}

	out
}

/// Formats a float with thousands separators and a single decimal.
fn group_float(value: f64) -> String {
	let negative = value < 0.0;
	let tenths = (value.abs() * 10.0).round() as i64;
	let (whole, frac) = (tenths / 10, tenths % 10);
	let sign = if negative { "-" } else { "" };

	format!("{sign}{}.{frac}", group_digits(whole))
}
// }}}
