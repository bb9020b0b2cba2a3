//! Validation for user-supplied command arguments. Every rejection
//! here is a user-tagged error, rendered as an ordinary reply.

use anyhow::anyhow;

use crate::context::{ErrorKind, TagError, TaggedError};

// {{{ Nickname
/// Nicknames are 3–15 alphanumeric characters, as enforced in-game.
pub fn parse_nickname(input: &str) -> Result<String, TaggedError> {
	let trimmed = input.trim();

	if (3..=15).contains(&trimmed.len()) && trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
		Ok(trimmed.to_owned())
	} else {
		Err(
			anyhow!("`{input}` is not a valid nickname (3–15 letters or digits)")
				.tag(ErrorKind::User),
		)
	}
}
// }}}
// {{{ Trainer code
/// Friend codes are twelve digits, commonly written in groups of four.
pub fn parse_trainer_code(input: &str) -> Result<String, TaggedError> {
	let digits: String = input.chars().filter(|c| !c.is_whitespace()).collect();

	if digits.len() == 12 && digits.chars().all(|c| c.is_ascii_digit()) {
		Ok(digits)
	} else {
		Err(anyhow!("`{input}` is not a valid trainer code (twelve digits)").tag(ErrorKind::User))
	}
}
// }}}
// {{{ Stat values
/// Parses a stat value, tolerating `1,234,567`-style separators.
pub fn parse_stat_value(input: &str) -> Result<f64, TaggedError> {
	let cleaned: String = input.chars().filter(|&c| c != ',' && c != ' ').collect();

	let value = cleaned
		.parse::<f64>()
		.map_err(|_| anyhow!("`{input}` is not a number").tag(ErrorKind::User))?;

	if value.is_finite() && value >= 0.0 {
		Ok(value)
	} else {
		Err(anyhow!("`{input}` is not a value this game hands out").tag(ErrorKind::User))
	}
}
// }}}
// {{{ Tests
#[cfg(test)]
mod converter_tests {
	use super::*;

	#[test]
	fn nickname_bounds() {
		assert_eq!(parse_nickname("abc").unwrap(), "abc");
		assert_eq!(parse_nickname("  Trainer99  ").unwrap(), "Trainer99");
		assert_eq!(parse_nickname("abcdefghijklmno").unwrap(), "abcdefghijklmno");

		for invalid in ["ab", "abcdefghijklmnop", "name with space", "nämé", ""] {
			let err = parse_nickname(invalid).unwrap_err();
			assert_eq!(err.kind, crate::context::ErrorKind::User, "{invalid}");
		}
	}

	#[test]
	fn trainer_codes_ignore_spacing() {
		assert_eq!(parse_trainer_code("123456789012").unwrap(), "123456789012");
		assert_eq!(
			parse_trainer_code("1234 5678 9012").unwrap(),
			"123456789012"
		);

		assert!(parse_trainer_code("1234 5678 901").is_err());
		assert!(parse_trainer_code("1234-5678-9012").is_err());
	}

	#[test]
	fn stat_values_tolerate_separators() {
		assert_eq!(parse_stat_value("25000000").unwrap(), 25_000_000.0);
		assert_eq!(parse_stat_value("25,000,000").unwrap(), 25_000_000.0);
		assert_eq!(parse_stat_value("1 234").unwrap(), 1_234.0);
		assert_eq!(parse_stat_value("1234.5").unwrap(), 1_234.5);

		assert!(parse_stat_value("a lot").is_err());
		assert!(parse_stat_value("-5").is_err());
		assert!(parse_stat_value("inf").is_err());
	}
}
// }}}
