use std::path::{Path, PathBuf};

use color_eyre::Result;
use configvault_fs::FileStorageClient;
use dirs::data_dir;
use tracing::debug;

use crate::config::Config;

/// Resolve the default record directory.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("configvault"))
}

/// Build the file-backed client, honoring the CLI flag over the config file
/// over the platform default.
pub fn client_from(cli_data_dir: Option<&Path>, config: &Config) -> Result<FileStorageClient> {
    let root = match cli_data_dir.or(config.data_dir.as_deref()) {
        Some(root) => root.to_path_buf(),
        None => default_data_dir()?,
    };
    debug!(?root, "initializing file storage");
    Ok(FileStorageClient::new(root))
}
