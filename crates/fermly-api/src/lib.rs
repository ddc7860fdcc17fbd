// fermly-api: Async Rust client for the Fermax Blue cloud API
//
// OAuth2 session handling (password grant + refresh), the pairings listing,
// and the directed open-door action. Higher-level session state lives in
// `fermly-core`.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod response;
pub mod transport;

pub use auth::{AuthState, Credentials, TokenManager, TokenState};
pub use client::ApiClient;
pub use error::{ApiError, AuthError};
pub use models::{AccessId, DoorEntry, Pairing};
pub use response::{DoorResponse, classify_response};
pub use transport::{AppIdentity, TransportConfig};
