use axum::Router;

pub mod admin;
pub mod secrets;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/secrets", secrets::router(state.clone()))
        .nest("/admin", admin::router(state.clone()))
        .with_state(state)
}
