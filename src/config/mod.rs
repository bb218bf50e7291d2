#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:3000";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
