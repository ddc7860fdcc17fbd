//! Command dispatch: bridges CLI args -> session calls -> output formatting.

pub mod check;
pub mod config_cmd;
pub mod doors;
pub mod home;
pub mod login;
pub mod pairings;
pub mod token;
pub mod util;
pub mod watch;

use std::time::Duration;

use tracing::{debug, warn};

use fermly_core::Session;

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, TokenCache};
use crate::error::CliError;

/// A session for the active profile plus the token cache backing it.
pub struct Context {
    pub session: Session,
    pub username: String,
    pub poll_interval: Duration,
    cache: Option<TokenCache>,
}

impl Context {
    /// Resolve configuration, build the session, and restore cached tokens
    /// unless `--no-cache` was given.
    pub async fn open(global: &GlobalOpts) -> Result<Self, CliError> {
        let resolved = config::resolve(global)?;
        let session = Session::new(&resolved.session)?;

        let username = resolved.session.username;

        let cache = (!global.no_cache).then(|| TokenCache::for_profile(&resolved.profile_name));
        match cache.as_ref().and_then(TokenCache::load) {
            Some(cached) if cached.belongs_to(&username) => {
                debug!(profile = %resolved.profile_name, "restoring cached tokens");
                session.import_tokens(cached.tokens).await;
            }
            Some(cached) => {
                debug!(
                    profile = %resolved.profile_name,
                    cached_for = %cached.username,
                    %username,
                    "cached tokens belong to another account, ignoring"
                );
            }
            None => {}
        }

        Ok(Self {
            session,
            username,
            poll_interval: resolved.poll_interval,
            cache,
        })
    }

    /// Write the session's current tokens back to the cache. Failures are
    /// logged and otherwise ignored.
    pub async fn persist_tokens(&self) {
        let Some(ref cache) = self.cache else {
            return;
        };
        let tokens = self.session.export_tokens().await;
        if tokens.is_empty() {
            return;
        }
        if let Err(e) = cache.save(&self.username, &tokens) {
            warn!(path = %cache.path().display(), error = %e, "could not write token cache");
        }
    }
}

/// Dispatch a session-bound command to its handler.
///
/// Tokens are persisted even when the command fails, since a refresh may
/// have happened before the failure.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let result = match cmd {
        Command::Login => login::handle(ctx, global).await,
        Command::Doors(args) => doors::handle(ctx, args, global).await,
        Command::Pairings(args) => pairings::handle(ctx, args, global).await,
        Command::Home => home::handle(ctx, global).await,
        Command::Check => check::handle(ctx, global).await,
        Command::Watch(args) => watch::handle(ctx, args, global).await,
        Command::Token(_) | Command::Config(_) | Command::Completions(_) => {
            Err(CliError::Validation {
                field: "command".into(),
                reason: "command does not use a session".into(),
            })
        }
    };
    ctx.persist_tokens().await;
    result
}
