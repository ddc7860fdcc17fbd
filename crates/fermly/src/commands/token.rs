//! Token cache commands. These never contact the API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::{GlobalOpts, TokenArgs, TokenCommand};
use crate::config::{self, CachedTokens, TokenCache};
use crate::error::CliError;
use crate::output;

/// What `token show` reports. Token values are never included.
#[derive(Debug, Serialize)]
struct TokenSummary {
    profile: String,
    path: String,
    cached: bool,
    username: Option<String>,
    status: &'static str,
    expires_at: Option<DateTime<Utc>>,
    refreshable: bool,
}

fn summarize(profile: &str, cache: &TokenCache, cached: Option<&CachedTokens>) -> TokenSummary {
    let tokens = cached.map(|c| &c.tokens);
    let status = match tokens {
        None => "none",
        Some(t) if t.needs_refresh() => "expiring",
        Some(_) => "valid",
    };
    TokenSummary {
        profile: profile.into(),
        path: cache.path().display().to_string(),
        cached: tokens.is_some(),
        username: cached.map(|c| c.username.clone()),
        status,
        expires_at: tokens.and_then(|t| t.expires_at),
        refreshable: tokens.is_some_and(|t| t.refresh_token.is_some()),
    }
}

fn detail(s: &TokenSummary) -> String {
    let expiry = s.expires_at.map_or_else(|| "-".into(), |at| at.to_rfc3339());
    let account = s.username.as_deref().unwrap_or("-");
    format!(
        "Profile:     {}\nCache:       {}\nAccount:     {account}\nStatus:      {}\nExpires:     {expiry}\nRefreshable: {}",
        s.profile, s.path, s.status, s.refreshable
    )
}

pub fn handle(args: TokenArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);
    let cache = TokenCache::for_profile(&profile_name);

    match args.command {
        TokenCommand::Show => {
            let cached = cache.load();
            let summary = summarize(&profile_name, &cache, cached.as_ref());
            let out = output::render_single(&global.output, &summary, detail, |s| {
                s.status.to_owned()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TokenCommand::Clear => {
            let removed = cache.clear()?;
            if !global.quiet {
                if removed {
                    eprintln!("✓ Cleared cached tokens for profile '{profile_name}'");
                } else {
                    eprintln!("No cached tokens for profile '{profile_name}'");
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use fermly_core::TokenState;

    use super::*;

    fn owned_by_alice(tokens: TokenState) -> CachedTokens {
        CachedTokens {
            username: "alice@example.com".into(),
            tokens,
        }
    }

    #[test]
    fn summary_reports_state_without_secrets() {
        let cache = TokenCache::new("/tmp/fermly/home/fermax_blue_token.json");
        let tokens = TokenState {
            access_token: Some("secret-access".into()),
            refresh_token: Some("secret-refresh".into()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        };

        let summary = summarize("home", &cache, Some(&owned_by_alice(tokens)));
        assert_eq!(summary.status, "valid");
        assert_eq!(summary.username.as_deref(), Some("alice@example.com"));
        assert!(summary.refreshable);

        let rendered = format!("{summary:?}{}", detail(&summary));
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }

    #[test]
    fn tokens_inside_the_buffer_are_expiring() {
        let cache = TokenCache::new("/tmp/t.json");
        let tokens = TokenState {
            access_token: Some("a".into()),
            refresh_token: None,
            expires_at: Some(Utc::now() + Duration::minutes(2)),
        };
        let summary = summarize("home", &cache, Some(&owned_by_alice(tokens)));
        assert_eq!(summary.status, "expiring");
        assert!(!summary.refreshable);
    }

    #[test]
    fn empty_cache_summary() {
        let cache = TokenCache::new("/tmp/t.json");
        let summary = summarize("home", &cache, None);
        assert_eq!(summary.status, "none");
        assert!(!summary.cached);
        assert!(summary.expires_at.is_none());
    }
}
