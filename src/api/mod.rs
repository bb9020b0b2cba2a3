//! Client for the remote statistics service.
//!
//! Every endpoint deserializes into a typed wire struct and maps it
//! into a domain value object before returning; unexpected response
//! shapes fail loudly instead of populating attributes dynamically.

use anyhow::anyhow;

use crate::context::{ErrorKind, TagError, TaggedError};
use crate::pogo::faction::Faction;

pub mod leaderboard;
pub mod social;
pub mod trainer;

pub(crate) fn api_url() -> Result<String, TaggedError> {
	std::env::var("TRAINERDEX_API_URL").map_err(|_| {
		anyhow!("This instance of `trainerdex` is not connected to a statistics server.")
			.tag(ErrorKind::User)
	})
}

pub(crate) fn api_token() -> Result<String, TaggedError> {
	std::env::var("TRAINERDEX_API_TOKEN").map_err(|_| anyhow!("No api token found").into())
}

/// Faction ids as they appear on the wire. A missing faction is
/// legal (older accounts predate team assignment); an out-of-range
/// one is a server bug we want to hear about.
pub(crate) fn faction_from_wire(id: Option<u8>) -> Result<Option<Faction>, TaggedError> {
	match id {
		None => Ok(None),
		Some(id) => Faction::from_id(id)
			.map(Some)
			.ok_or_else(|| anyhow!("The server returned an unknown faction id: {id}").into()),
	}
}
