// handlers/public/auth/mod.rs - Public authentication handlers

pub mod token; // POST /token - exchange admin credentials for a bearer token

pub use token::token_post;
