use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, trace};

/// Env files read at startup, in load order. Values already present in the
/// process environment win over file values.
pub const ENV_FILES: [&str; 2] = [".env", ".env.secrets"];

fn find_env_file(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let candidates = [dir.join(file_name), dir.join("../..").join(file_name)];

    match candidates.into_iter().find(|path| path.exists()) {
        Some(path) => {
            trace!("Found environment file: {}", path.display());
            Some(path)
        }
        None => {
            trace!(
                "No environment file named {:?} in {} or the workspace root",
                file_name,
                dir.display()
            );
            None
        }
    }
}

fn load_env_file(path: &Path) -> Result<(), anyhow::Error> {
    dotenv::from_path(path)
        .with_context(|| format!("Failed to load environment variables from {}", path.display()))?;
    debug!("Loaded environment variables from: {}", path.display());
    Ok(())
}

/// Loads `.env` and `.env.secrets` from `dir` (or two levels up, the workspace root
/// when run from a crate directory). Missing files are not an error, unreadable ones are.
pub fn load_optional_env_files(dir: &Path) -> Result<Vec<PathBuf>, anyhow::Error> {
    let mut loaded = Vec::new();
    for file_name in ENV_FILES {
        if let Some(path) = find_env_file(dir, file_name) {
            load_env_file(&path)?;
            loaded.push(path);
        }
    }
    Ok(loaded)
}

pub fn configure_env() -> Result<(), anyhow::Error> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    load_optional_env_files(&cwd)?;
    Ok(())
}
