//! Subcommands of the `invcheck` binary.

pub mod batch;
pub mod config;
pub mod input;
pub mod process;

use std::path::Path;

use invcheck_core::InvcheckConfig;

/// Load the configuration named by `--config`, or the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvcheckConfig> {
    match config_path {
        Some(path) => Ok(InvcheckConfig::from_file(Path::new(path))?),
        None => Ok(InvcheckConfig::default()),
    }
}
