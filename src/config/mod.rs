//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → WalletConfig (validated, immutable)
//!     → handed to startup wiring, sections cloned into subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::WalletConfig;
pub use schema::SessionConfig;
pub use schema::RelayConfig;
pub use schema::RelayMetadataConfig;
pub use schema::GasConfig;
pub use schema::NodeConfig;
pub use schema::ObservabilityConfig;
pub use schema::LogFormat;

pub use loader::{apply_env_overrides, load_config, parse_config, ConfigError};
pub use validation::{validate_config, ValidationError};
