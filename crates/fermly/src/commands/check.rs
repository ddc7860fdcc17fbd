//! `fermly check`: log in and list doors, reporting how many were found.

use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Serialize)]
struct CheckReport {
    username: String,
    doors: usize,
}

pub async fn handle(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let doors = ctx.session.test_connection().await?;
    let report = CheckReport {
        username: ctx.username.clone(),
        doors,
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| {
            let line = format!("✓ Connected as {} ({} doors)", r.username, r.doors);
            if r.doors == 0 {
                output::caution(&line, color)
            } else {
                output::success(&line, color)
            }
        },
        |r| r.doors.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
