use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the whole-database export/import endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransferConfig {
    /// Lock-wait applied to the connection used for a snapshot or an import.
    /// TOML: `transfer.busy_timeout_secs`. Default: `10`.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,

    /// Largest accepted upload body for `/api/import-db`.
    /// TOML: `transfer.max_upload_bytes`. Default: 64 MiB.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// File name suggested to the client in `Content-Disposition`.
    /// TOML: `transfer.export_filename`. Default: `Loop_Export.db`.
    #[serde(default = "default_export_filename")]
    pub export_filename: String,
}

impl TransferConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            busy_timeout_secs: default_busy_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
            export_filename: default_export_filename(),
        }
    }
}

fn default_busy_timeout_secs() -> u64 {
    10
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_export_filename() -> String {
    "Loop_Export.db".to_string()
}
