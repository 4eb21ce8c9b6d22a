pub mod subscriptions;
pub mod users;

use axum::{Router, middleware};

use crate::adapters::http::{app_state::AppState, middleware::api_token_auth};

pub fn router(app_state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/subscriptions", subscriptions::router())
        .layer(middleware::from_fn_with_state(app_state, api_token_auth))
}
