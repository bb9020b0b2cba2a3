// {{{ Imports
use db::{connect_db, SqlitePool};

use crate::context::paths::TrainerDexPaths;
// }}}

pub mod db;
pub mod paths;

// {{{ Common types
pub type Error = anyhow::Error;
pub type PoiseContext<'a> = poise::Context<'a, BotContext, Error>;
// }}}
// {{{ Error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	User,
	Internal,
}

#[derive(Debug)]
pub struct TaggedError {
	pub kind: ErrorKind,
	pub error: Error,
}

impl TaggedError {
	#[inline]
	pub fn new(kind: ErrorKind, error: Error) -> Self {
		Self { kind, error }
	}
}

impl<E: Into<Error>> From<E> for TaggedError {
	fn from(value: E) -> Self {
		Self::new(ErrorKind::Internal, value.into())
	}
}

pub trait TagError {
	fn tag(self, tag: ErrorKind) -> TaggedError;
}

impl TagError for Error {
	fn tag(self, tag: ErrorKind) -> TaggedError {
		TaggedError::new(tag, self)
	}
}
// }}}
// {{{ BotContext
/// Custom user data passed to all command functions
#[derive(Clone)]
pub struct BotContext {
	pub db: SqlitePool,
	pub http_client: reqwest::Client,
	pub paths: TrainerDexPaths,
}

impl BotContext {
	pub fn new() -> Result<Self, Error> {
		let paths = TrainerDexPaths::new()?;
		let db = connect_db(&paths.db_path())?;

		Ok(Self {
			db,
			http_client: reqwest::Client::new(),
			paths,
		})
	}
}
// }}}
// {{{ Testing helpers
#[cfg(test)]
pub mod testing {
	use tempfile::TempDir;

	use super::*;
	use crate::commands::discord::mock::MockContext;

	/// Builds a context around a throwaway config database.
	pub fn get_test_data() -> Result<(BotContext, TempDir), Error> {
		let dir = tempfile::tempdir()?;
		let paths = TrainerDexPaths::at(dir.path());
		let db = connect_db(&paths.db_path())?;

		Ok((
			BotContext {
				db,
				http_client: reqwest::Client::new(),
				paths,
			},
			dir,
		))
	}

	pub fn get_mock_context() -> Result<(MockContext, TempDir), Error> {
		let (data, dir) = get_test_data()?;
		Ok((MockContext::new(data), dir))
	}
}
// }}}
