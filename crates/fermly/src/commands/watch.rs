//! `fermly watch`: refresh on a fixed interval until Ctrl-C.
//!
//! Transient failures are reported and the next tick retries; errors the
//! user has to fix (bad password, bad config) end the loop.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Serialize)]
struct Tick {
    at: DateTime<Utc>,
    doors: usize,
    home: String,
}

fn period(args: &WatchArgs, ctx: &Context) -> Result<Duration, CliError> {
    match args.interval {
        Some(0) => Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be at least 1 minute".into(),
        }),
        Some(minutes) => Ok(Duration::from_secs(minutes.saturating_mul(60))),
        None => Ok(ctx.poll_interval),
    }
}

pub async fn handle(ctx: &Context, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let period = period(&args, ctx)?;
    info!(interval_secs = period.as_secs(), "watching");

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut refreshes = 0u32;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!("interrupted");
                break;
            }
        }

        match ctx.session.refresh().await {
            Ok(snapshot) => {
                let tick = Tick {
                    at: snapshot.refreshed_at.unwrap_or_else(Utc::now),
                    doors: snapshot.doors.len(),
                    home: snapshot.home.name.clone(),
                };
                let out = output::render_single(
                    &global.output,
                    &tick,
                    |t| format!("{}  {} doors  {}", t.at.format("%Y-%m-%d %H:%M:%S"), t.doors, t.home),
                    |t| t.doors.to_string(),
                )?;
                output::print_output(&out, global.quiet);
            }
            Err(e) if e.is_user_correctable() => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "refresh failed; retrying next interval");
                if !global.quiet {
                    let color = output::should_color(&global.color);
                    eprintln!("{}", output::caution(&format!("! {e}"), color));
                }
            }
        }
        ctx.persist_tokens().await;

        refreshes += 1;
        if args.count.is_some_and(|limit| refreshes >= limit) {
            break;
        }
    }
    Ok(())
}
