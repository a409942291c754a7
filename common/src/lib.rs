//! Shared building blocks for the planwire crates: the error type, the
//! transport version and the session configuration.

pub mod config;
pub mod error;
pub mod version;

pub use config::{SessionConfiguration, SessionConfigurationBuilder};
pub use error::{CommonError, Diagnose, Result};
pub use version::TransportVersion;
