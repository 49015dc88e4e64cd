use std::sync::Arc;

use crate::auth::TokenService;
use crate::sheets::SpreadsheetClient;

/// Shared, read-only application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub sheets: Arc<SpreadsheetClient>,
}

impl AppState {
    pub fn new(tokens: TokenService, sheets: SpreadsheetClient) -> Self {
        Self {
            tokens: Arc::new(tokens),
            sheets: Arc::new(sheets),
        }
    }
}
