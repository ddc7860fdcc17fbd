//! Pairing command handlers.

use tabled::Tabled;

use fermly_core::Pairing;

use crate::cli::{GlobalOpts, PairingsArgs, PairingsCommand};
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Tabled)]
struct PairingRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Tag")]
    tag: String,
    #[tabled(rename = "Home")]
    home: String,
    #[tabled(rename = "Doors")]
    doors: String,
}

impl From<&Pairing> for PairingRow {
    fn from(p: &Pairing) -> Self {
        let visible = p.access_door_map.values().filter(|d| d.visible).count();
        Self {
            id: p.id.clone(),
            device: p.device_id.clone(),
            tag: p.tag.clone().unwrap_or_default(),
            home: p.home.clone().unwrap_or_default(),
            doors: format!("{visible}/{}", p.access_door_map.len()),
        }
    }
}

pub async fn handle(
    ctx: &Context,
    args: PairingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PairingsCommand::List => {
            let pairings = ctx.session.list_pairings().await?;
            let out = output::render_list(
                &global.output,
                &pairings,
                |p| PairingRow::from(p),
                |p| p.device_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
