//! Application router configuration.

use axum::{
    Router, middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};

use crate::{
    AppState, Error,
    analytics::get_analytics,
    dashboard::get_dashboard,
    endpoints,
    logging::logging_middleware,
    source::{connect_source_endpoint, delete_source_endpoint, get_sources_endpoint},
    transaction::create_transaction_endpoint,
    transaction_table::{export_transactions_csv, get_transactions_page},
    user::{get_user, register_user},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::USER, get(get_user))
        .route(endpoints::DASHBOARD, get(get_dashboard))
        .route(endpoints::ANALYTICS, get(get_analytics))
        .route(
            endpoints::USER_TRANSACTIONS,
            get(get_transactions_page).post(create_transaction_endpoint),
        )
        .route(endpoints::EXPORT_TRANSACTIONS, get(export_transactions_csv))
        .route(
            endpoints::USER_SOURCES,
            get(get_sources_endpoint).post(connect_source_endpoint),
        )
        .route(endpoints::SOURCE, delete(delete_source_endpoint))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
