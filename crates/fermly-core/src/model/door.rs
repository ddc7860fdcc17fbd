use serde::{Deserialize, Serialize};

use fermly_api::AccessId;

/// One controllable door: a visible relay on a paired intercom unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    /// `<device_id>_<door_key>`, stable across refreshes.
    pub id: String,
    /// `<tag> <title>`, e.g. "Lobby Main".
    pub display_name: String,
    pub device_id: String,
    /// Key of the entry in the pairing's access-door map.
    pub door_key: String,
    pub door_title: String,
    /// The pairing's tag, empty when the vendor sent none.
    pub pairing_tag: String,
    pub access_id: AccessId,
    /// The pairing's home label, empty when the vendor sent none.
    pub home_name: String,
}
