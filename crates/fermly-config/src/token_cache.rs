// ── Token cache ──
//
// Persists the session's exported `TokenState` between CLI runs so a valid
// access token is reused instead of logging in on every invocation. The
// cache is best effort: unreadable files load as "no tokens".
//
// Tokens are stored with the username that obtained them. A session for any
// other username must not import them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fermly_core::TokenState;

use crate::{ConfigError, data_dir};

pub const TOKEN_CACHE_FILE: &str = "fermax_blue_token.json";

/// Tokens together with the account they were issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTokens {
    pub username: String,
    pub tokens: TokenState,
}

impl CachedTokens {
    /// Whether these tokens were issued to `username`.
    pub fn belongs_to(&self, username: &str) -> bool {
        self.username == username
    }
}

/// JSON file holding one profile's tokens.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/<profile>/fermax_blue_token.json`
    pub fn for_profile(profile_name: &str) -> Self {
        Self::new(data_dir().join(profile_name).join(TOKEN_CACHE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached tokens, or `None` when the file is missing, corrupt, or empty.
    pub fn load(&self) -> Option<CachedTokens> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read token cache");
                return None;
            }
        };

        match serde_json::from_str::<CachedTokens>(&raw) {
            Ok(cached) if cached.tokens.is_empty() => None,
            Ok(cached) => {
                debug!(path = %self.path.display(), username = %cached.username, "loaded cached tokens");
                Some(cached)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt token cache");
                None
            }
        }
    }

    /// Write `username`'s tokens, replacing any previous cache. The file is
    /// readable by the owner only on Unix.
    pub fn save(&self, username: &str, tokens: &TokenState) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let cached = CachedTokens {
            username: username.to_owned(),
            tokens: tokens.clone(),
        };
        let json = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&self.path, json)?;
        restrict_permissions(&self.path)?;
        debug!(path = %self.path.display(), "token cache written");
        Ok(())
    }

    /// Delete the cache. Returns `false` if there was nothing to delete.
    pub fn clear(&self) -> Result<bool, ConfigError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
