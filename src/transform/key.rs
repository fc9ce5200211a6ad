//! Key lookup: env var, then `.env` in the target directory.

use super::TransformError;
use log::{debug, info};
use std::path::Path;

/// Environment variable holding the key.
pub const KEY_ENV_VAR: &str = "CRYPTPOOL_KEY";

fn non_empty_var() -> Option<String> {
    let value = std::env::var(KEY_ENV_VAR).ok()?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Read the key: `CRYPTPOOL_KEY` → `.env` in `dir` (if given).
///
/// # Errors
///
/// Returns [`TransformError::MissingKey`] when neither source has a
/// non-empty value.
pub fn load_key(dir: Option<&Path>) -> Result<String, TransformError> {
    if let Some(key) = non_empty_var() {
        info!("Key found in environment");
        return Ok(key);
    }

    if let Some(env_path) = dir.map(|d| d.join(".env")).filter(|p| p.is_file()) {
        debug!("Loading {}", env_path.display());
        let _ = dotenvy::from_path(&env_path);
        if let Some(key) = non_empty_var() {
            info!("Key found in {}", env_path.display());
            return Ok(key);
        }
    }

    Err(TransformError::MissingKey {
        var: KEY_ENV_VAR.to_string(),
    })
}
