pub mod config;
pub mod db;
pub mod error;
pub mod server;
pub mod transfer;

pub use error::LoopError;
pub use transfer::DatabaseTransfer;
