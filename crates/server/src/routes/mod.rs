pub mod auth;
pub mod cars;
pub mod health;
pub mod home;
pub mod settings;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api",
        cars::router()
            .merge(home::router())
            .merge(settings::router())
            .merge(auth::router())
            .merge(health::router()),
    )
}
