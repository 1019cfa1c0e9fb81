mod app;

pub use app::{ApiErrorBody, ApiErrorObject, LoopError, MIN_SNAPSHOT_SQLITE_VERSION};
