use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

// Local mirror of downloaded filing artifacts
pub const DEFAULT_CACHE_DIR: &str = "data/cache";

// CSV tables and per-filing JSON bundles
pub const DEFAULT_OUTPUT_DIR: &str = "data/output";

pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::create_dir_all(path).with_context(|| format!("Failed to create directory {:?}", path))?;
    Ok(())
}
