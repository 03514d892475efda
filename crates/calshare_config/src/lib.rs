//! Configuration loading for Calshare.
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults (server address)
//! 2. `config/default.*` and `config/{RUN_ENV}.*`, both optional
//! 3. plain `SUPABASE_URL` / `SUPABASE_ANON_KEY`
//! 4. prefixed variables such as `CALSHARE__SUPABASE__URL`
//!
//! The result is validated before it is returned, so a missing endpoint or
//! key fails at startup rather than on the first request.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub mod env_vars;
pub mod models;
pub use models::*;

/// Variable naming the directory that holds the layered config files
pub const CONFIG_DIR_VAR: &str = "CALSHARE_CONFIG_DIR";

/// Loads the application configuration from `.env`, config files and the process environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();
    let vars: HashMap<String, String> = env::vars().collect();
    load_config_from(&config_dir(&vars), &vars)
}

/// Loads the configuration from an explicit config directory and variable set.
///
/// `load_config` delegates here; tests call it directly so they never touch
/// the process environment.
pub fn load_config_from(
    config_dir: &Path,
    vars: &HashMap<String, String>,
) -> Result<AppConfig, ConfigError> {
    let run_env = vars
        .get("RUN_ENV")
        .cloned()
        .unwrap_or_else(|| "debug".to_string());
    let prefix = env_vars::get_config_prefix(vars);

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);
    debug!("config: default_path: {}", default_path.display());
    debug!("config: env_path: {}", env_path.display());

    let builder = Config::builder()
        .set_default("server.host", DEFAULT_HOST)?
        .set_default("server.port", i64::from(DEFAULT_PORT))?
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix(&prefix)
                .separator(env_vars::CONFIG_SEPARATOR)
                .source(Some(env_vars::plain_vars_as_prefixed(vars, &prefix))),
        )
        .add_source(
            Environment::with_prefix(&prefix)
                .separator(env_vars::CONFIG_SEPARATOR)
                .source(Some(vars.clone())),
        );

    let config: AppConfig = builder.build()?.try_deserialize()?;
    config.validate()?;

    info!(
        "Configuration loaded (RUN_ENV={}, supabase.url={})",
        run_env, config.supabase.url
    );
    Ok(config)
}

fn config_dir(vars: &HashMap<String, String>) -> PathBuf {
    vars.get(CONFIG_DIR_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config"))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// The file is `DOTENV_OVERRIDE` if set, else the first command line argument
/// when it starts with `.env`, else `.env`. Loading happens at most once per
/// process; a missing file is not an error.
///
/// Returns the path that was (or would have been) loaded.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
