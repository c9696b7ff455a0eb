//! CLI configuration -- thin wrapper around `innkeep_config`.
//!
//! Adds `GlobalOpts`-aware resolution (--config, --timeout) on top of the
//! shared loader.

use std::sync::Arc;
use std::time::Duration;

use innkeep_core::{FileCredentialStore, ProgressChannel, Reporter};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use innkeep_config::{
    Config, config_path, load_config, save_config, store_client_secret, to_service_config,
    token_path,
};

/// The config file in effect: `--config` if given, else the platform default.
pub fn config_file(global: &GlobalOpts) -> std::path::PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config(Some(&config_file(global)))?)
}

/// Build a `Reporter` from config plus flag overrides. Touches no network.
pub fn build_reporter(global: &GlobalOpts, progress: ProgressChannel) -> Result<Reporter, CliError> {
    let cfg = load(global)?;
    let service = to_service_config(&cfg, global.timeout.map(Duration::from_secs))?;
    let store = Arc::new(FileCredentialStore::new(token_path(&cfg)));

    tracing::debug!(
        api_url = %service.api_url,
        tokens = %store.path().display(),
        "building reporter"
    );
    Ok(Reporter::new(service, store, progress)?)
}
