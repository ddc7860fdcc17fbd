//! `fermly home`

use fermly_core::HomeInfo;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::Context;

fn detail(home: &HomeInfo) -> String {
    let mut lines = vec![format!("Name:    {}", home.name), format!("ID:      {}", home.id)];
    if !home.address.is_empty() {
        lines.push(format!("Address: {}", home.address));
    }
    lines.join("\n")
}

pub async fn handle(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let home = ctx.session.refresh().await?.home.clone();
    let out = output::render_single(&global.output, &home, detail, |h| h.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
