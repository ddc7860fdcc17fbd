// fermly-core: Session state and door model between fermly-api and hosts.

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::SessionConfig;
pub use convert::{home_info, map_doors};
pub use error::CoreError;
pub use model::{Door, HomeInfo};
pub use session::{DeviceSnapshot, Session};

// Wire and token types hosts need without depending on fermly-api.
pub use fermly_api::{AccessId, AuthState, Pairing, TokenState, TransportConfig};
