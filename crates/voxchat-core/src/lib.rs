pub mod config;
pub mod error;
pub mod paths;

pub use config::VoxchatConfig;
pub use error::{Result, VoxchatError};
