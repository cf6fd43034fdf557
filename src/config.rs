use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::export::BASE_CHUNK_NAME;

/// File name of the project-level config, looked up at the project root.
pub const CONFIG_FILE_NAME: &str = ".chunkreview.json";

/// Hard safety ceiling: files larger than this are **always** skipped, regardless of config.
/// Generated bundles of this size are not worth a review request per declaration.
pub const ABSOLUTE_MAX_FILE_BYTES: u64 = 1_000_000; // 1 MB

/// Controls workspace scanning behavior (what to skip).
///
/// Note: `.gitignore` is always respected by the scanner; these are additional
/// hard skips for noisy directories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory *names* to skip anywhere in the tree (e.g. "generated", "tmp").
    ///
    /// These are compared against path components, not full paths.
    pub exclude_dir_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where `chunk` writes JSON chunks when no `--output` is given.
    pub output_dir: PathBuf,
    pub scan: ScanConfig,
    pub max_file_bytes: u64,
    /// Worker threads for batch chunking; 0 lets rayon decide.
    pub workers: usize,
    /// File stem of the whole-file skeleton chunk.
    pub base_chunk_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(".chunkreview"),
            scan: ScanConfig::default(),
            // 512 KB default.
            max_file_bytes: 512 * 1024,
            workers: 0,
            base_chunk_name: BASE_CHUNK_NAME.to_string(),
        }
    }
}

impl Config {
    /// Configured size limit, capped by [`ABSOLUTE_MAX_FILE_BYTES`].
    pub fn effective_max_file_bytes(&self) -> u64 {
        self.max_file_bytes.min(ABSOLUTE_MAX_FILE_BYTES)
    }
}

pub fn load_config(repo_root: &Path) -> Config {
    let primary = repo_root.join(CONFIG_FILE_NAME);

    let Ok(text) = std::fs::read_to_string(&primary) else {
        return Config::default();
    };

    match serde_json::from_str::<Config>(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[config] WARN: could not parse {}: {e}", primary.display());
            Config::default()
        }
    }
}
