pub mod env;
pub mod io;
pub mod schema;

pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, parse_config};
pub use schema::{
    GatewaySettings, GenerationSettings, LoggingSettings, ProviderConfig, ProviderKind,
    SessionSettings, StackForgeConfig, ThrottleSettings,
};
