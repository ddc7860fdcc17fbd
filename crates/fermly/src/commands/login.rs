//! `fermly login`: force a password-grant login and cache the tokens.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Serialize)]
struct LoginReport {
    username: String,
    expires_at: Option<DateTime<Utc>>,
    refreshable: bool,
}

pub async fn handle(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let tokens = ctx.session.authenticate().await?;
    let report = LoginReport {
        username: ctx.username.clone(),
        expires_at: tokens.expires_at,
        refreshable: tokens.refresh_token.is_some(),
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| {
            let expiry = r
                .expires_at
                .map_or_else(|| "unknown".into(), |at| at.to_rfc3339());
            format!(
                "{}\nToken expires: {expiry}",
                output::success(&format!("✓ Logged in as {}", r.username), color)
            )
        },
        |r| r.username.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
