// ── Pairing → domain conversions ──
//
// Flattens the vendor's nested pairing documents (pairing → access-door
// map → access id) into `Door` records and a `HomeInfo` summary.

use fermly_api::Pairing;

use crate::model::home::{DEFAULT_HOME_NAME, UNKNOWN_HOME_ID};
use crate::model::{Door, HomeInfo};

/// Name used for a unit the user never tagged in the app.
pub const DEFAULT_DEVICE_TAG: &str = "Telefonillo";

/// One `Door` per visible access-door entry, pairing by pairing, in
/// document order. Hidden entries are relays the account may not control
/// and are skipped.
pub fn map_doors(pairings: &[Pairing]) -> Vec<Door> {
    pairings
        .iter()
        .flat_map(|pairing| {
            let device_name = pairing.tag.as_deref().unwrap_or(DEFAULT_DEVICE_TAG);
            pairing
                .access_door_map
                .iter()
                .filter(|(_, entry)| entry.visible)
                .map(move |(key, entry)| {
                    let title = entry
                        .title
                        .clone()
                        .unwrap_or_else(|| format!("Door {key}"));
                    Door {
                        id: format!("{}_{key}", pairing.device_id),
                        display_name: format!("{device_name} {title}"),
                        device_id: pairing.device_id.clone(),
                        door_key: key.clone(),
                        door_title: title,
                        pairing_tag: pairing.tag.clone().unwrap_or_default(),
                        access_id: entry.access_id,
                        home_name: pairing.home.clone().unwrap_or_default(),
                    }
                })
        })
        .collect()
}

/// Home summary from the first pairing, or the placeholder home when the
/// account has none.
pub fn home_info(pairings: &[Pairing]) -> HomeInfo {
    let Some(first) = pairings.first() else {
        return HomeInfo::default();
    };

    HomeInfo {
        id: if first.id.is_empty() {
            UNKNOWN_HOME_ID.into()
        } else {
            first.id.clone()
        },
        name: first
            .home
            .clone()
            .unwrap_or_else(|| DEFAULT_HOME_NAME.into()),
        address: first.address.clone().unwrap_or_default(),
    }
}
