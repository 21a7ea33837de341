//! Reads configuration files from disk.

use crate::{resolve_env_vars, ConfigError};
use std::path::Path;

/// Reads a configuration file and resolves environment variables in it.
pub(crate) async fn load_file(path: impl AsRef<Path>) -> Result<String, ConfigError> {
	let path = path.as_ref();
	let content = tokio::fs::read_to_string(path).await.map_err(|e| {
		ConfigError::Io(std::io::Error::new(
			e.kind(),
			format!("Cannot read {}: {}", path.display(), e),
		))
	})?;
	resolve_env_vars(&content)
}
