pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod sheets;
pub mod state;
pub mod types;

pub use app::app;
