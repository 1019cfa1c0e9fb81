use serde::{Deserialize, Serialize};

/// Cross-origin policy applied to every `/api` route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API (exact match, scheme included).
    /// TOML: `cors.allowed_origins`. Default: the hosted web client
    /// (`https://melodious-tenderness-production.up.railway.app`) and the local dev
    /// server (`http://localhost:5173`).
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// How long browsers may cache a preflight response, in seconds.
    /// TOML: `cors.max_age_secs`. Default: `3600`.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "https://melodious-tenderness-production.up.railway.app".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

fn default_max_age_secs() -> u64 {
    3600
}
