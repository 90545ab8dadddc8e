//! Configuration loading for Guardrail

mod schema;

pub use schema::{default_weights, Config, GitHookConfig, Thresholds, CONFIG_VERSION};

use crate::state::{StateDir, StateFile};
use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Load `.guardrail/config.json`, writing the defaults on first use.
///
/// A config file that fails to parse is an error: it is user-edited and is
/// never silently replaced.
pub fn load_or_init(state: &StateDir) -> Result<Config> {
    let loaded: Option<Config> = state
        .read(StateFile::Config)
        .context("Invalid Guardrail configuration")?;

    let config = match loaded {
        Some(config) => {
            debug!("Loaded config from {}", state.file(StateFile::Config).display());
            config
        }
        None => {
            let config = Config::default();
            save(state, &config)?;
            debug!(
                "Created default config at {}",
                state.file(StateFile::Config).display()
            );
            config
        }
    };

    for problem in config.warnings() {
        warn!("{}", problem);
    }
    Ok(config)
}

/// Persist the config
pub fn save(state: &StateDir, config: &Config) -> Result<()> {
    state
        .write(StateFile::Config, config)
        .context("Failed to save Guardrail configuration")
}
