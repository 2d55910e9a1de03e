mod config;
mod error;
mod extract;
mod routes;
mod state;

use std::{net::SocketAddr, sync::Arc};

use config::Config;
use db::DBService;
use services::services::{
    auth::AuthService,
    catalog::CatalogService,
    gemini_api::GeminiApiClient,
    rate_limit::{AllowAllPolicy, HttpPolicyClient, PolicyClient},
    settings::SettingsService,
    storage::SupabaseStorage,
};
use state::AppState;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    utils::logging::init(&config.log_level);

    info!("starting carhub server on port {}", config.server_port);

    let db = DBService::new(&config.database_url).await?;

    let storage = SupabaseStorage::new(&config.supabase_url, config.supabase_service_key.clone())?;

    let gemini = match &config.gemini_api_key {
        Some(key) => Some(GeminiApiClient::new(
            key.clone(),
            config.gemini_model.clone(),
        )?),
        None => {
            warn!("GEMINI_API_KEY not set - AI extraction endpoints will fail");
            None
        }
    };

    let policy: Arc<dyn PolicyClient> = match config.policy_service_url.clone() {
        Some(url) => Arc::new(HttpPolicyClient::new(url)?),
        None => {
            warn!("POLICY_SERVICE_URL not set - image search will not be rate limited");
            Arc::new(AllowAllPolicy)
        }
    };

    let state = AppState {
        auth: AuthService::new(&config.auth_jwt_secret),
        catalog: Arc::new(CatalogService::new(
            db.pool.clone(),
            Arc::new(storage),
            gemini,
            policy,
        )),
        settings: Arc::new(SettingsService::new(db.pool.clone())),
        db,
    };

    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
