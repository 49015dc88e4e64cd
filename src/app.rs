use axum::{
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Build the full router: public routes, bearer-protected `/api` routes and global layers.
pub fn app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/token", post(public::token_post))
        // Protected
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{spreadsheets, worksheets};

    Router::new()
        // Spreadsheet lifecycle
        .route("/api/spreadsheets/create", post(spreadsheets::create))
        .route("/api/spreadsheets/:id", delete(spreadsheets::delete))
        .route("/api/spreadsheets/:id/rename", put(spreadsheets::rename))
        // Worksheets within a spreadsheet
        .route("/api/:id/worksheets", get(worksheets::list))
        .route("/api/:id/:worksheet", get(worksheets::get))
        .route("/api/:id/:worksheet/rename", put(worksheets::rename))
        .route("/api/:id/:worksheet/read", get(worksheets::read))
        .route("/api/:id/:worksheet/write", post(worksheets::write))
        .route("/api/:id/:worksheet/append", post(worksheets::append))
        .route("/api/:id/:worksheet/add", post(worksheets::add))
        .route("/api/:id/:worksheet/clear", put(worksheets::clear))
        .route("/api/:id/:worksheet/delete", delete(worksheets::delete))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring unparseable CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
