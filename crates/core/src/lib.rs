pub mod config;
pub mod error;
pub mod policy;
pub mod types;

pub use config::Config;
pub use error::*;
pub use policy::determine_alert_level;
pub use types::*;
