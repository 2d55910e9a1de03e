use std::sync::Arc;

use db::DBService;
use services::services::{auth::AuthService, catalog::CatalogService, settings::SettingsService};

/// Dependency container built once at startup and shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub auth: AuthService,
    pub catalog: Arc<CatalogService>,
    pub settings: Arc<SettingsService>,
}
