use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub backend_url: String,
    pub backend_api_key: String,
    pub clinic_utc_offset_minutes: i32,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            jwt_secret: env::var("CLINIC_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            backend_url: env::var("CLINIC_BACKEND_URL")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_BACKEND_URL not set, falling back to in-memory storage");
                    String::new()
                }),
            backend_api_key: env::var("CLINIC_BACKEND_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_BACKEND_API_KEY not set, using empty value");
                    String::new()
                }),
            clinic_utc_offset_minutes: env::var("CLINIC_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|raw| match raw.parse() {
                    Ok(minutes) => Some(minutes),
                    Err(_) => {
                        warn!("CLINIC_UTC_OFFSET_MINUTES is not a number, using 0");
                        None
                    }
                })
                .unwrap_or(0),
            port: env::var("PORT")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }

    pub fn has_rest_backend(&self) -> bool {
        !self.backend_url.is_empty() && !self.backend_api_key.is_empty()
    }
}
