// ── Domain model ──
//
// Flat, host-facing records derived from the vendor pairing documents.
// Rebuilt from scratch on every refresh.

pub mod door;
pub mod home;

pub use door::Door;
pub use home::HomeInfo;
