//! Client configuration loading.

use std::path::Path;

use meetmap_core::config::ClientConfig;
use meetmap_core::error::Result;

/// Loads [`ClientConfig`] from a TOML file.
///
/// A missing file is not an error: the client runs on defaults until a
/// config file exists.
pub struct ConfigService;

impl ConfigService {
    /// Reads and parses the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file exists but cannot be read, or
    /// `Serialization` if it is not valid TOML.
    pub async fn load(path: impl AsRef<Path>) -> Result<ClientConfig> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                let config = toml::from_str(&text)?;
                tracing::debug!("Loaded client config from {}", path.display());
                Ok(config)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(ClientConfig::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}
