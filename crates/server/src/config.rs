use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub log_level: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub auth_jwt_secret: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub policy_service_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://carhub.db".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .unwrap_or(3001),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            supabase_url: env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?,
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .context("SUPABASE_SERVICE_ROLE_KEY must be set")?,
            auth_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .context("SUPABASE_JWT_SECRET must be set")?,
            gemini_api_key: env::var("GEMINI_API_KEY").ok(),
            gemini_model: env::var("GEMINI_MODEL").ok(),
            policy_service_url: env::var("POLICY_SERVICE_URL").ok(),
        })
    }
}
