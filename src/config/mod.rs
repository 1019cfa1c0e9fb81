mod basic;
mod cors;
mod transfer;

pub use basic::BasicConfig;
pub use cors::CorsConfig;
pub use transfer::TransferConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Cross-origin policy (see `cors` table in config.toml).
    #[serde(default)]
    pub cors: CorsConfig,

    /// Export/import settings (see `transfer` table in config.toml).
    #[serde(default)]
    pub transfer: TransferConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "LOOP_";

impl Config {
    /// Builds a Figment that merges defaults, an optional config TOML file and `LOOP_*` env vars.
    ///
    /// Nested keys use `__` in env names, e.g. `LOOP_BASIC__DATABASE_URL`.
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration from defaults, `config.toml` (if present) and the environment.
    pub fn load() -> Self {
        let cfg: Self = Self::figment()
            .extract()
            .unwrap_or_else(|err| panic!("failed to extract configuration: {err}"));
        if cfg.basic.database_url.trim().is_empty() {
            panic!("basic.database_url must be set and non-empty");
        }
        cfg
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::load);
