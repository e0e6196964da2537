//! Waybill Core - shared data structures, errors and infrastructure
//!
//! Everything the session manager, the API client and the CLI have in common lives here

pub mod config;
pub mod error;
pub mod logging;
pub mod polling;
pub mod traits;
pub mod types;

pub use self::config::*;
pub use error::*;
pub use logging::*;
pub use polling::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use tokio;
pub use tracing;
