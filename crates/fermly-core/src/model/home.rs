use serde::{Deserialize, Serialize};

pub const UNKNOWN_HOME_ID: &str = "unknown";
pub const DEFAULT_HOME_NAME: &str = "Fermax Blue Home";

/// Summary of the installation, taken from the first pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeInfo {
    pub id: String,
    pub name: String,
    pub address: String,
}

impl Default for HomeInfo {
    fn default() -> Self {
        Self {
            id: UNKNOWN_HOME_ID.into(),
            name: DEFAULT_HOME_NAME.into(),
            address: String::new(),
        }
    }
}
