// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware (injects AuthUser)

pub mod spreadsheets; // spreadsheet lifecycle
pub mod utils;
pub mod worksheets;   // worksheet lifecycle and row operations
