//! Door command handlers.

use tabled::Tabled;
use tracing::info;

use fermly_core::Door;

use crate::cli::{DoorsArgs, DoorsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DoorRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Door")]
    title: String,
    #[tabled(rename = "Access")]
    access: String,
    #[tabled(rename = "Home")]
    home: String,
}

impl From<&Door> for DoorRow {
    fn from(d: &Door) -> Self {
        Self {
            id: d.id.clone(),
            name: d.display_name.clone(),
            title: d.door_title.clone(),
            access: d.access_id.to_string(),
            home: d.home_name.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: DoorsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DoorsCommand::List => {
            let snapshot = ctx.session.refresh().await?;
            let out = output::render_list(
                &global.output,
                &snapshot.doors,
                |d| DoorRow::from(d),
                |d| d.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DoorsCommand::Open { door_id } => {
            let snapshot = ctx.session.refresh().await?;
            let door = snapshot.door(&door_id).ok_or_else(|| CliError::NotFound {
                resource_type: "door".into(),
                identifier: door_id.clone(),
                list_command: "doors list".into(),
            })?;

            if !util::confirm(
                "doors open",
                &format!("Open '{}'?", door.display_name),
                global.yes,
            )? {
                return Ok(());
            }

            if !ctx.session.open_door_by_id(&door.id).await? {
                return Err(CliError::DoorRefused {
                    door: door.display_name.clone(),
                });
            }

            info!(door = %door.id, "door opened");
            if !global.quiet {
                let color = output::should_color(&global.color);
                eprintln!(
                    "{}",
                    output::success(&format!("✓ Opened {}", door.display_name), color)
                );
            }
            Ok(())
        }
    }
}
