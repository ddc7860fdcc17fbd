// Fermax Blue API response types
//
// Wire models for `GET /pairing/api/v3/pairings/me`. Fields use
// `#[serde(default)]` liberally because the vendor omits keys freely;
// anything not modelled explicitly lands in `extra`.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

// ── AccessId ─────────────────────────────────────────────────────────

/// Vendor three-part address of a relay on an intercom unit.
///
/// Sent verbatim as the body of the open-door request:
/// ```json
/// { "block": 1, "subblock": 0, "number": 5 }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessId {
    pub block: i32,
    pub subblock: i32,
    pub number: i32,
}

impl AccessId {
    pub const fn new(block: i32, subblock: i32, number: i32) -> Self {
        Self {
            block,
            subblock,
            number,
        }
    }
}

impl std::fmt::Display for AccessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.block, self.subblock, self.number)
    }
}

// ── Pairing ──────────────────────────────────────────────────────────

/// One intercom unit linked to the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pairing {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub device_id: String,
    /// User-assigned display name of the unit.
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Door key → door metadata, in document order.
    #[serde(default)]
    pub access_door_map: IndexMap<String, DoorEntry>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One entry of a pairing's `accessDoorMap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorEntry {
    #[serde(default)]
    pub title: Option<String>,
    /// Hidden entries are relays the account may not control.
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(default)]
    pub access_id: AccessId,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn visible_by_default() -> bool {
    true
}

/// Identifiers arrive as strings on current firmware and as numbers on
/// some older installations.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn pairing_decodes_vendor_shape() {
        let raw = json!({
            "id": "p-1",
            "deviceId": "D1",
            "tag": "Lobby",
            "home": "Calle Mayor 1",
            "status": "ACTIVE",
            "accessDoorMap": {
                "ZERO": {
                    "title": "Main",
                    "visible": true,
                    "accessId": { "block": 100, "subblock": -1, "number": 0 }
                },
                "ONE": {
                    "accessId": { "block": 100, "subblock": -1, "number": 1 }
                }
            }
        });

        let pairing: Pairing = serde_json::from_value(raw).unwrap();

        assert_eq!(pairing.device_id, "D1");
        assert_eq!(pairing.tag.as_deref(), Some("Lobby"));
        assert_eq!(pairing.extra.get("status"), Some(&json!("ACTIVE")));

        let keys: Vec<_> = pairing.access_door_map.keys().cloned().collect();
        assert_eq!(keys, ["ZERO", "ONE"]);

        let one = &pairing.access_door_map["ONE"];
        assert!(one.visible, "absent visible flag should default to true");
        assert!(one.title.is_none());
        assert_eq!(one.access_id, AccessId::new(100, -1, 1));
    }

    #[test]
    fn numeric_identifiers_become_strings() {
        let pairing: Pairing =
            serde_json::from_value(json!({ "id": 42, "deviceId": 9001 })).unwrap();
        assert_eq!(pairing.id, "42");
        assert_eq!(pairing.device_id, "9001");
        assert!(pairing.access_door_map.is_empty());
    }

    #[test]
    fn partial_access_id_defaults_missing_parts() {
        let entry: DoorEntry =
            serde_json::from_value(json!({ "accessId": { "number": 3 } })).unwrap();
        assert_eq!(entry.access_id, AccessId::new(0, 0, 3));
    }

    #[test]
    fn access_id_serializes_as_request_body() {
        let body = serde_json::to_value(AccessId::new(1, 0, 5)).unwrap();
        assert_eq!(body, json!({ "block": 1, "subblock": 0, "number": 5 }));
    }
}
