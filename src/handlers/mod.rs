// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer token required)
pub mod public;    // /token and service info
pub mod protected; // /api/* spreadsheet and worksheet operations
