// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition plus the service info and liveness endpoints.
// Route Prefix: none (e.g., /token, /health)

pub mod auth;
pub mod info;

pub use auth::*;
pub use info::{health, root};
