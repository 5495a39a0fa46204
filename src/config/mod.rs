//! Configuration module.
//!
//! Settings resolve in four layers, lowest precedence first: built-in
//! defaults, the TOML config file, `MEALSNAP_*` environment variables, and
//! command-line flags.

pub mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, load_config_with_precedence, merge_config,
    ConfigError, ConfigFile, ResolvedConfig, StoreKind,
};
